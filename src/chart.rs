//! Session chart rendering
//!
//! The chart has two panels: stakes per round as bars colored by outcome and
//! annotated with the round's balance change, and the cumulative net profit
//! as a line with shaded profit and loss zones. The shipped renderer writes a
//! self-contained SVG document.

use std::fmt::Write;

use crate::config::ChartConfig;
use crate::errors::ChartError;
use crate::format::{chips, signed_chips};
use crate::games::types::{Chips, GameRecord, Outcome};

const BACKGROUND: &str = "#2f3136";
const PANEL: &str = "#36393f";
const ACCENT: &str = "#ffd700";
const PROFIT_ZONE: &str = "#00ff41";
const LOSS_ZONE: &str = "#ff4757";

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const PANEL_TOP_PAD: f64 = 60.0;
const PANEL_BOTTOM_PAD: f64 = 50.0;

/// Renders a game log into image bytes
pub trait ChartRenderer {
    fn render(&self, log: &[GameRecord], starting_balance: Chips) -> Result<Vec<u8>, ChartError>;

    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;

    /// File extension for saved charts
    fn extension(&self) -> &'static str;
}

/// One round as drawn on the chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub round: usize,
    pub stake: Chips,
    pub outcome: Outcome,
    /// Balance change of the round including side-bet winnings
    pub delta: Chips,
    /// Running sum of deltas
    pub cumulative: Chips,
    /// Starting balance plus the running sum
    pub balance: Chips,
}

/// Chart data derived from a game log
pub fn chart_points(log: &[GameRecord], starting_balance: Chips) -> Vec<ChartPoint> {
    let mut cumulative = 0;
    log.iter()
        .enumerate()
        .map(|(i, record)| {
            let delta = record.delta();
            cumulative += delta;
            ChartPoint {
                round: i + 1,
                stake: record.amount,
                outcome: record.outcome,
                delta,
                cumulative,
                balance: starting_balance + cumulative,
            }
        })
        .collect()
}

pub fn outcome_color(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Win => "#00ff41",
        Outcome::Lose => "#ff4757",
        Outcome::Blackjack => "#ffd700",
        Outcome::CashOut => "#00aaff",
        Outcome::Tie => "#ffaa00",
    }
}

/// SVG implementation of [`ChartRenderer`]
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    config: ChartConfig,
    currency: String,
}

/// Drawing area of one panel
struct Panel {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Panel {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Center of the `index`-th of `count` equal slots
    fn slot_center(&self, index: usize, count: usize) -> f64 {
        let slot = self.width / count as f64;
        self.left + slot * (index as f64 + 0.5)
    }
}

impl SvgChartRenderer {
    pub fn new(config: ChartConfig, currency: impl Into<String>) -> Self {
        Self {
            config,
            currency: currency.into(),
        }
    }

    fn panels(&self) -> (Panel, Panel) {
        let width = self.config.width as f64;
        let half = self.config.height as f64 / 2.0;
        let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = half - PANEL_TOP_PAD - PANEL_BOTTOM_PAD;

        let bars = Panel {
            left: MARGIN_LEFT,
            top: PANEL_TOP_PAD,
            width: plot_width,
            height: plot_height,
        };
        let trend = Panel {
            left: MARGIN_LEFT,
            top: half + PANEL_TOP_PAD,
            width: plot_width,
            height: plot_height,
        };
        (bars, trend)
    }

    fn write_bars(&self, svg: &mut String, panel: &Panel, points: &[ChartPoint]) -> Result<(), ChartError> {
        let max_stake = points.iter().map(|p| p.stake).max().unwrap_or(1).max(1) as f64;
        let slot = panel.width / points.len() as f64;
        let bar_width = slot * 0.7;
        // Leave headroom above the tallest bar for its label
        let usable = panel.height * 0.85;

        self.write_panel_frame(svg, panel, &format!("🎰 {} - Individual Game Results", self.config.title))?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="12" font-weight="bold" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">Bet Amount ({})</text>"#,
            panel.left - 60.0,
            panel.top + panel.height / 2.0,
            panel.left - 60.0,
            panel.top + panel.height / 2.0,
            escape(&self.currency)
        )?;

        for (i, point) in points.iter().enumerate() {
            let height = point.stake as f64 / max_stake * usable;
            let x = panel.slot_center(i, points.len()) - bar_width / 2.0;
            let y = panel.bottom() - height;

            writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.7" stroke="white" stroke-width="0.5"/>"#,
                x,
                y,
                bar_width,
                height,
                outcome_color(point.outcome)
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="10" font-weight="bold" text-anchor="middle">{}</text>"#,
                x + bar_width / 2.0,
                y - 4.0,
                escape(&signed_chips(&self.currency, point.delta))
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="10" text-anchor="middle">{}</text>"#,
                x + bar_width / 2.0,
                panel.bottom() + 14.0,
                point.round
            )?;
        }

        self.write_axis_label(svg, panel)?;
        Ok(())
    }

    fn write_trend(
        &self,
        svg: &mut String,
        panel: &Panel,
        points: &[ChartPoint],
    ) -> Result<(), ChartError> {
        let lowest = points.iter().map(|p| p.cumulative).min().unwrap_or(0).min(0) as f64;
        let highest = points.iter().map(|p| p.cumulative).max().unwrap_or(0).max(0) as f64;
        let span = if highest > lowest { highest - lowest } else { 1.0 };
        // Keep annotations inside the panel
        let inner_top = panel.top + 30.0;
        let inner_height = panel.height - 60.0;
        let y_of = |value: f64| inner_top + (highest - value) / span * inner_height;
        let zero = y_of(0.0);

        let coords: Vec<(f64, f64, Chips)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (panel.slot_center(i, points.len()), y_of(p.cumulative as f64), p.cumulative))
            .collect();

        self.write_panel_frame(svg, panel, "📈 Cumulative Profit/Loss Trend")?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="12" font-weight="bold" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">Session Net Profit ({})</text>"#,
            panel.left - 60.0,
            panel.top + panel.height / 2.0,
            panel.left - 60.0,
            panel.top + panel.height / 2.0,
            escape(&self.currency)
        )?;

        for pair in coords.windows(2) {
            let (x0, y0, v0) = pair[0];
            let (x1, y1, v1) = pair[1];

            if (v0 >= 0) == (v1 >= 0) {
                write_zone(svg, &[(x0, zero), (x0, y0), (x1, y1), (x1, zero)], v0 >= 0 && v1 >= 0)?;
            } else {
                // Split the segment where it crosses zero
                let t = v0 as f64 / (v0 - v1) as f64;
                let xc = x0 + (x1 - x0) * t;
                write_zone(svg, &[(x0, zero), (x0, y0), (xc, zero)], v0 >= 0)?;
                write_zone(svg, &[(xc, zero), (x1, y1), (x1, zero)], v1 >= 0)?;
            }
        }

        writeln!(
            svg,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="white" stroke-width="2" stroke-dasharray="8 6" stroke-opacity="0.7"/>"#,
            panel.left,
            zero,
            panel.left + panel.width,
            zero
        )?;

        let path: Vec<String> = coords.iter().map(|(x, y, _)| format!("{:.1},{:.1}", x, y)).collect();
        writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path.join(" "),
            ACCENT
        )?;

        for (i, ((x, y, _), point)) in coords.iter().zip(points).enumerate() {
            writeln!(svg, r#"<circle cx="{:.1}" cy="{:.1}" r="6" fill="{}"/>"#, x, y, ACCENT)?;

            let offset = if i % 2 == 0 { -28.0 } else { 18.0 };
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="9" font-weight="bold" text-anchor="middle"><tspan x="{:.1}">{}</tspan><tspan x="{:.1}" dy="11">({})</tspan></text>"#,
                x,
                y + offset,
                x,
                escape(&signed_chips(&self.currency, point.delta)),
                x,
                escape(&chips(&self.currency, point.balance))
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="10" text-anchor="middle">{}</text>"#,
                x,
                panel.bottom() + 14.0,
                point.round
            )?;
        }

        self.write_legend(svg, panel)?;
        self.write_stats_box(svg, panel, points)?;
        self.write_axis_label(svg, panel)?;
        Ok(())
    }

    fn write_panel_frame(&self, svg: &mut String, panel: &Panel, title: &str) -> Result<(), ChartError> {
        writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            panel.left,
            panel.top,
            panel.width,
            panel.height,
            PANEL
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" fill="{}" font-size="16" font-weight="bold" text-anchor="middle">{}</text>"#,
            panel.left + panel.width / 2.0,
            panel.top - 20.0,
            ACCENT,
            escape(title)
        )?;
        Ok(())
    }

    fn write_axis_label(&self, svg: &mut String, panel: &Panel) -> Result<(), ChartError> {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="12" font-weight="bold" text-anchor="middle">Game Number</text>"#,
            panel.left + panel.width / 2.0,
            panel.bottom() + 34.0
        )?;
        Ok(())
    }

    fn write_legend(&self, svg: &mut String, panel: &Panel) -> Result<(), ChartError> {
        let x = panel.left + panel.width - 140.0;
        let y = panel.top + 10.0;
        let entries = [
            (ACCENT, "Net Profit"),
            (PROFIT_ZONE, "Profit Zone"),
            (LOSS_ZONE, "Loss Zone"),
        ];

        for (i, (color, label)) in entries.iter().enumerate() {
            let row = y + i as f64 * 16.0;
            writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="12" height="10" fill="{}" fill-opacity="0.6"/><text x="{:.1}" y="{:.1}" fill="white" font-size="10">{}</text>"#,
                x,
                row,
                color,
                x + 18.0,
                row + 9.0,
                label
            )?;
        }
        Ok(())
    }

    fn write_stats_box(&self, svg: &mut String, panel: &Panel, points: &[ChartPoint]) -> Result<(), ChartError> {
        let count = |outcome: Outcome| points.iter().filter(|p| p.outcome == outcome).count();
        let wins = count(Outcome::Win);
        let win_rate = wins as f64 / points.len() as f64 * 100.0;
        let final_profit = points.last().map(|p| p.cumulative).unwrap_or(0);

        let lines = [
            "📊 Session Stats:".to_string(),
            format!(
                "Games: {} | W: {} | L: {} | T: {} | BJ: {}",
                points.len(),
                wins,
                count(Outcome::Lose),
                count(Outcome::Tie),
                count(Outcome::Blackjack)
            ),
            format!(
                "Win Rate: {:.1}% | Final P&L: {}",
                win_rate,
                signed_chips(&self.currency, final_profit)
            ),
        ];

        let x = panel.left + 10.0;
        let y = panel.top + 10.0;
        writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="300" height="58" rx="6" fill="{}" fill-opacity="0.8" stroke="{}"/>"#,
            x,
            y,
            PANEL,
            ACCENT
        )?;
        for (i, line) in lines.iter().enumerate() {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="11">{}</text>"#,
                x + 8.0,
                y + 16.0 + i as f64 * 16.0,
                escape(line)
            )?;
        }
        Ok(())
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, log: &[GameRecord], starting_balance: Chips) -> Result<Vec<u8>, ChartError> {
        if !self.config.enabled {
            return Err(ChartError::Disabled);
        }
        if log.is_empty() {
            return Err(ChartError::EmptyLog);
        }
        let (width, height) = (self.config.width, self.config.height);
        if width < 200 || height < 200 {
            return Err(ChartError::InvalidDimensions { width, height });
        }

        let points = chart_points(log, starting_balance);
        let (bars, trend) = self.panels();
        let mut svg = String::with_capacity(4096 + points.len() * 1024);

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="DejaVu Sans, sans-serif">"#,
            w = width,
            h = height
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="{}"/>"#, BACKGROUND)?;
        self.write_bars(&mut svg, &bars, &points)?;
        self.write_trend(&mut svg, &trend, &points)?;
        svg.push_str("</svg>\n");

        Ok(svg.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

fn write_zone(svg: &mut String, corners: &[(f64, f64)], profit: bool) -> Result<(), ChartError> {
    let points: Vec<String> = corners.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect();
    writeln!(
        svg,
        r#"<polygon points="{}" fill="{}" fill-opacity="0.3"/>"#,
        points.join(" "),
        if profit { PROFIT_ZONE } else { LOSS_ZONE }
    )?;
    Ok(())
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
