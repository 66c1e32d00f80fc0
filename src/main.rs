use std::path::{Path, PathBuf};

use clap::Parser;
use sheet_nester::config::{NestConfig, NestJob};
use sheet_nester::render;
use sheet_nester::solver::Solver;
use sheet_nester::types::{Part, Plan, PlanReport, Size};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "sheet_nester",
    about = "Nest rectangular part outlines onto stock sheets"
)]
struct Cli {
    /// Sheet dimensions in mm (WxH, e.g. 1000x1000)
    #[arg(long, required_unless_present = "job")]
    sheet: Option<String>,

    /// Parts as [name=]WxH[:qty] (e.g. bracket=400x300:6 120x80)
    #[arg(long = "parts", num_args = 1..)]
    parts: Vec<String>,

    /// Clearance around every part in mm
    #[arg(long, default_value_t = 0.0)]
    gap: f64,

    /// Disable 90° rotation
    #[arg(long)]
    no_rotate: bool,

    /// Refuse runs with more items than this
    #[arg(long, default_value_t = 10_000)]
    max_items: u64,

    /// JSON job file with sheet, parts and settings
    #[arg(long, conflicts_with_all = ["sheet", "parts", "gap", "no_rotate", "max_items"])]
    job: Option<PathBuf>,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity on stderr
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

fn parse_dimensions(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid dimensions '{}', expected WxH", s))?;
    let w = w
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = h
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    let size = Size::new(w, h);
    if !size.is_valid() {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok(size)
}

fn parse_part(index: usize, s: &str) -> Result<Part, String> {
    let (name, spec) = match s.split_once('=') {
        Some((name, spec)) => (Some(name.trim()), spec),
        None => (None, s),
    };
    let (dims, qty) = match spec.rsplit_once(':') {
        Some((dims, qty)) => {
            let qty = qty
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{}'", s))?;
            (dims, qty)
        }
        None => (spec, 1),
    };
    let size = parse_dimensions(dims)?;
    let name = name.map(str::to_string).unwrap_or_else(|| size.to_string());
    Ok(Part::new(format!("part-{}", index + 1), name, size.w, size.h, qty))
}

fn load_job(path: &Path) -> Result<NestJob, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid job file {}: {}", path.display(), e))
}

fn job_from_flags(cli: &Cli) -> Result<NestJob, String> {
    let sheet = parse_dimensions(cli.sheet.as_deref().unwrap_or_default())?;
    let parts = cli
        .parts
        .iter()
        .enumerate()
        .map(|(i, p)| parse_part(i, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NestJob {
        sheet,
        parts,
        config: NestConfig::new()
            .with_gap(cli.gap)
            .with_rotation(!cli.no_rotate)
            .with_max_items(cli.max_items),
    })
}

fn print_plan(plan: &Plan, layout: bool) {
    for (i, sheet) in plan.sheets.iter().enumerate() {
        println!(
            "Sheet {} ({:.1}% used, {} part{}):",
            i + 1,
            sheet.utilization(plan.stock) * 100.0,
            sheet.placements.len(),
            if sheet.placements.len() == 1 { "" } else { "s" },
        );
        for p in &sheet.placements {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} {}x{} @ ({}, {}){}", p.name, p.w, p.h, p.x, p.y, rot);
        }
        if layout {
            print!("{}", render::render_sheet(plan.stock, &sheet.placements));
        }
        println!();
    }

    println!(
        "Summary: {} sheet{} used, {:.1}% utilization ({})",
        plan.sheet_count(),
        if plan.sheet_count() == 1 { "" } else { "s" },
        plan.utilization() * 100.0,
        plan.strategy,
    );
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(cli.log_level)
        .init();

    let job = match &cli.job {
        Some(path) => load_job(path),
        None => job_from_flags(&cli),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let solver = Solver::new(job.sheet, job.config, job.parts);
    let plan = solver.solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&PlanReport::from(plan)) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_plan(&plan, cli.layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("1000x500").unwrap(), Size::new(1000.0, 500.0));
        assert_eq!(parse_dimensions("12.5x3").unwrap(), Size::new(12.5, 3.0));
        assert!(parse_dimensions("1000").is_err());
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("axb").is_err());
    }

    #[test]
    fn test_parse_part_forms() {
        let named = parse_part(0, "bracket=400x300:6").unwrap();
        assert_eq!(named.name, "bracket");
        assert_eq!(named.id, "part-1");
        assert_eq!(named.qty, 6);
        assert_eq!(named.bounds, Some(Size::new(400.0, 300.0)));

        let bare = parse_part(1, "120x80").unwrap();
        assert_eq!(bare.name, "120x80");
        assert_eq!(bare.id, "part-2");
        assert_eq!(bare.qty, 1);

        assert!(parse_part(2, "120x80:many").is_err());
    }

    #[test]
    fn test_cli_flags_build_job() {
        let cli = Cli::parse_from([
            "sheet_nester",
            "--sheet",
            "1000x1000",
            "--parts",
            "400x300:6",
            "--gap",
            "2",
            "--no-rotate",
        ]);
        let job = job_from_flags(&cli).unwrap();
        assert_eq!(job.sheet, Size::new(1000.0, 1000.0));
        assert_eq!(job.parts.len(), 1);
        assert_eq!(job.config.gap, 2.0);
        assert!(!job.config.allow_rotate);
    }

    #[test]
    fn test_job_conflicts_with_flags() {
        let res = Cli::try_parse_from(["sheet_nester", "--job", "job.json", "--sheet", "10x10"]);
        assert!(res.is_err());
    }
}
