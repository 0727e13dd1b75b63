/// Layout and drawing of the portfolio shell around the viewer
use crossterm::{
    cursor,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use folio_core::portfolio::{
    CardAction, DemoFrame, ModalAction, Section, Shell, Theme, FOOTER_TEXT, HERO_SUBTITLE,
    HERO_TITLE, LOGO_TEXT, NO_DEMO_TEXT, PROJECTS_SUBTITLE, PROJECTS_TITLE,
};
use std::io::{self, Write};

use crate::host::Viewport;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Color,
    pub background: Color,
    pub accent: Color,
    pub muted: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                foreground: Color::White,
                background: Color::Black,
                accent: Color::Magenta,
                muted: Color::DarkGrey,
            },
            Theme::Light => Self {
                foreground: Color::Black,
                background: Color::White,
                accent: Color::DarkMagenta,
                muted: Color::Grey,
            },
        }
    }
}

/// Screen regions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    pub rows: u16,
    /// Hero viewer container; empty when the terminal is too small
    pub viewer: Viewport,
    pub footer_row: u16,
    pub status_row: u16,
}

const NAVBAR_ROWS: u16 = 2;
const MIN_VIEWER_COLS: u16 = 8;

impl Layout {
    pub fn compute(cols: u16, rows: u16) -> Self {
        let status_row = rows.saturating_sub(1);
        let footer_row = rows.saturating_sub(2);
        let body_rows = footer_row.saturating_sub(NAVBAR_ROWS + 1);

        let viewer_left = cols / 2;
        let viewer_cols = cols.saturating_sub(viewer_left + 1);
        let viewer = if viewer_cols >= MIN_VIEWER_COLS && body_rows > 0 {
            Viewport::new(viewer_left, NAVBAR_ROWS, viewer_cols, body_rows)
        } else {
            Viewport::new(viewer_left, NAVBAR_ROWS, 0, 0)
        };

        Self {
            cols,
            rows,
            viewer,
            footer_row,
            status_row,
        }
    }
}

/// Everything outside the viewer grid
pub fn draw_shell<W: Write>(
    out: &mut W,
    shell: &Shell,
    layout: &Layout,
    status: &str,
) -> io::Result<()> {
    let palette = Palette::for_theme(shell.theme);
    out.queue(SetBackgroundColor(palette.background))?;
    out.queue(SetForegroundColor(palette.foreground))?;
    out.queue(Clear(ClearType::All))?;

    draw_navbar(out, shell, layout, &palette)?;
    match shell.section {
        Section::Home => draw_hero(out, layout, &palette)?,
        Section::Projects => draw_projects(out, shell, layout, &palette)?,
    }

    out.queue(cursor::MoveTo(0, layout.footer_row))?;
    out.queue(SetForegroundColor(palette.muted))?;
    out.queue(Print(fit(FOOTER_TEXT, layout.cols)))?;
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    out.queue(Print(fit(status, layout.cols)))?;
    out.queue(ResetColor)?;
    Ok(())
}

fn draw_navbar<W: Write>(out: &mut W, shell: &Shell, layout: &Layout, palette: &Palette) -> io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(SetForegroundColor(palette.accent))?;
    out.queue(Print(format!("\u{26a1} {}", LOGO_TEXT)))?;

    let mut x = LOGO_TEXT.chars().count() as u16 + 6;
    for (key, section) in [('1', Section::Home), ('2', Section::Projects)] {
        out.queue(cursor::MoveTo(x, 0))?;
        if shell.section == section {
            out.queue(SetAttribute(Attribute::Underlined))?;
            out.queue(SetForegroundColor(palette.accent))?;
        } else {
            out.queue(SetForegroundColor(palette.foreground))?;
        }
        let label = format!("[{}] {}", key, section.label());
        out.queue(Print(&label))?;
        out.queue(SetAttribute(Attribute::NoUnderline))?;
        x += label.chars().count() as u16 + 2;
    }

    let toggle = format!("[t] {}", shell.theme.toggle_icon());
    out.queue(cursor::MoveTo(layout.cols.saturating_sub(toggle.chars().count() as u16 + 2), 0))?;
    out.queue(SetForegroundColor(palette.foreground))?;
    out.queue(Print(toggle))?;
    Ok(())
}

fn draw_hero<W: Write>(out: &mut W, layout: &Layout, palette: &Palette) -> io::Result<()> {
    let width = layout.viewer.left.saturating_sub(3);
    let mut row = NAVBAR_ROWS + 2;

    out.queue(SetAttribute(Attribute::Bold))?;
    out.queue(cursor::MoveTo(2, row))?;
    out.queue(SetForegroundColor(palette.accent))?;
    out.queue(Print(fit(HERO_TITLE[0], width)))?;
    out.queue(cursor::MoveTo(2, row + 1))?;
    out.queue(SetForegroundColor(palette.foreground))?;
    out.queue(Print(fit(HERO_TITLE[1], width)))?;
    out.queue(SetAttribute(Attribute::NormalIntensity))?;
    row += 3;

    for line in wrap(HERO_SUBTITLE, width as usize) {
        out.queue(cursor::MoveTo(2, row))?;
        out.queue(Print(line))?;
        row += 1;
    }

    out.queue(cursor::MoveTo(2, row + 1))?;
    out.queue(SetForegroundColor(palette.accent))?;
    out.queue(Print(fit("[2] View Projects", width)))?;
    Ok(())
}

fn draw_projects<W: Write>(out: &mut W, shell: &Shell, layout: &Layout, palette: &Palette) -> io::Result<()> {
    let width = layout.cols.saturating_sub(4);
    out.queue(cursor::MoveTo(2, NAVBAR_ROWS))?;
    out.queue(SetAttribute(Attribute::Bold))?;
    out.queue(Print(fit(PROJECTS_TITLE, width)))?;
    out.queue(SetAttribute(Attribute::NormalIntensity))?;
    out.queue(cursor::MoveTo(2, NAVBAR_ROWS + 1))?;
    out.queue(SetForegroundColor(palette.muted))?;
    out.queue(Print(fit(PROJECTS_SUBTITLE, width)))?;

    let mut row = NAVBAR_ROWS + 3;
    for (index, project) in shell.projects().iter().enumerate() {
        if row + 3 >= layout.footer_row {
            break;
        }
        let marker = if index == shell.cursor() { '>' } else { ' ' };
        out.queue(cursor::MoveTo(1, row))?;
        out.queue(SetForegroundColor(if index == shell.cursor() {
            palette.accent
        } else {
            palette.foreground
        }))?;
        out.queue(Print(fit(
            &format!("{} [{}] {}", marker, project.category, project.title),
            width,
        )))?;

        out.queue(cursor::MoveTo(5, row + 1))?;
        out.queue(SetForegroundColor(palette.muted))?;
        out.queue(Print(fit(&project.description, width.saturating_sub(4))))?;

        let actions: Vec<String> = project
            .card_actions()
            .iter()
            .map(|action| match action {
                CardAction::LaunchDemo => format!("[Enter] {}", action.label()),
                CardAction::ViewCode => format!("[c] {}", action.label()),
            })
            .collect();
        out.queue(cursor::MoveTo(5, row + 2))?;
        out.queue(SetForegroundColor(palette.foreground))?;
        out.queue(Print(fit(
            &format!("{}   {}", project.tech.join(" \u{b7} "), actions.join("  ")),
            width.saturating_sub(4),
        )))?;
        row += 4;
    }
    Ok(())
}

/// Modal box centered over the page
pub fn draw_modal<W: Write>(out: &mut W, shell: &Shell, layout: &Layout) -> io::Result<()> {
    let Some(project) = shell.modal_project() else {
        return Ok(());
    };
    let palette = Palette::for_theme(shell.theme);

    let width = layout.cols.saturating_sub(8).min(72);
    let height = layout.rows.saturating_sub(6).min(14);
    if width < 20 || height < 8 {
        return Ok(());
    }
    let left = (layout.cols - width) / 2;
    let top = (layout.rows - height) / 2;
    let inner = width - 4;

    out.queue(SetBackgroundColor(palette.background))?;
    for y in top..top + height {
        out.queue(cursor::MoveTo(left, y))?;
        let edge = if y == top || y == top + height - 1 { '-' } else { ' ' };
        out.queue(SetForegroundColor(palette.muted))?;
        out.queue(Print(format!("|{}|", edge.to_string().repeat(width as usize - 2))))?;
    }

    out.queue(cursor::MoveTo(left + 2, top + 1))?;
    out.queue(SetForegroundColor(palette.accent))?;
    out.queue(SetAttribute(Attribute::Bold))?;
    out.queue(Print(fit(&project.title, inner - 4)))?;
    out.queue(SetAttribute(Attribute::NormalIntensity))?;
    out.queue(cursor::MoveTo(left + width - 5, top + 1))?;
    out.queue(Print("[x]"))?;

    let mut row = top + 3;
    out.queue(SetForegroundColor(palette.foreground))?;
    match project.demo_frame() {
        Some(frame) => {
            out.queue(cursor::MoveTo(left + 2, row))?;
            out.queue(Print(fit(&format!("Demo: {}", frame.src), inner)))?;
            out.queue(cursor::MoveTo(left + 2, row + 1))?;
            out.queue(SetForegroundColor(palette.muted))?;
            out.queue(Print(fit(&format!("allow: {}", DemoFrame::allow_attribute()), inner)))?;
        }
        None => {
            out.queue(cursor::MoveTo(left + 2, row))?;
            out.queue(Print(fit(NO_DEMO_TEXT, inner)))?;
        }
    }
    row += 3;

    out.queue(SetForegroundColor(palette.foreground))?;
    for line in wrap(&project.description, inner as usize).into_iter().take(3) {
        out.queue(cursor::MoveTo(left + 2, row))?;
        out.queue(Print(line))?;
        row += 1;
    }

    let actions: Vec<String> = shell
        .modal_actions()
        .iter()
        .map(|action| match action {
            ModalAction::OpenInNewTab => format!("[o] {}", action.label()),
            ModalAction::ViewSource => format!("[c] {}", action.label()),
        })
        .collect();
    out.queue(cursor::MoveTo(left + 2, top + height - 2))?;
    out.queue(SetForegroundColor(palette.accent))?;
    out.queue(Print(fit(&format!("{}  [Esc] Close", actions.join("  ")), inner)))?;
    out.queue(ResetColor)?;
    Ok(())
}

/// Truncate to `width` characters
fn fit(text: &str, width: u16) -> String {
    text.chars().take(width as usize).collect()
}

/// Greedy word wrap
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    let mut line = String::new();
    for word in text.split_whitespace() {
        let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
