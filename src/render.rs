use crate::types::{Placement, Size};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Draws one sheet as ASCII art, scaled to fit an 80x40 character box.
/// Row 0 is the top edge of the sheet.
pub fn render_sheet(stock: Size, placements: &[Placement]) -> String {
    if !stock.is_valid() {
        return String::new();
    }
    let scale = f64::min(MAX_WIDTH / stock.w, MAX_HEIGHT / stock.h);
    let grid_w = (stock.w * scale).round() as usize;
    let grid_h = (stock.h * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in placements {
        let sx = (p.x * scale).round() as usize;
        let sw = (p.w * scale).round() as usize;
        let sh = (p.h * scale).round() as usize;
        // flip so the sheet origin ends up bottom-left
        let sy = grid_h.saturating_sub(((p.y + p.h) * scale).round() as usize);

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label = format!("{}x{}", p.w.round(), p.h.round());
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn edge(current: char, line: char) -> char {
    if current == '+' || (matches!(current, '-' | '|') && current != line) {
        '+'
    } else {
        line
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = match grid.first() {
        Some(row) => row.len(),
        None => return,
    };

    for i in x..=x + w {
        if i >= cols {
            break;
        }
        for j in [y, y + h] {
            if j < rows {
                grid[j][i] = edge(grid[j][i], '-');
            }
        }
    }

    for j in y..=y + h {
        if j >= rows {
            break;
        }
        for i in [x, x + w] {
            if i < cols {
                grid[j][i] = edge(grid[j][i], '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
