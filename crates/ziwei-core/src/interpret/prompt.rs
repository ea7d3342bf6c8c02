//! Prompt assembly for narrative generation
//!
//! Renders a chart snapshot (plus transit overlay, when the scope has one)
//! into the prompt handed to the narrative backend. Deterministic: identical
//! inputs produce the identical prompt, which keeps cache keys honest about
//! what they cache.

use crate::chart::{ChartSnapshot, InterpretScope, TransitDate, TransitOverlay};
use std::fmt::Write;

/// Build the generation prompt for a chart, scope, and optional overlay
pub fn build_prompt(
    chart: &ChartSnapshot,
    scope: InterpretScope,
    date: &TransitDate,
    overlay: Option<&TransitOverlay>,
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "{}", scope_instruction(scope, date));
    let _ = writeln!(prompt);

    let _ = writeln!(
        prompt,
        "Birth: solar date {}, hour branch {}",
        chart.birth.solar_date, chart.birth.hour_branch
    );
    if let Some(lunar) = &chart.birth.lunar_date {
        let _ = writeln!(prompt, "Lunar date: {lunar}");
    }
    if let Some(gender) = &chart.birth.gender {
        let _ = writeln!(prompt, "Gender: {gender}");
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Palaces:");
    for palace in &chart.palaces {
        let stars = if palace.stars.is_empty() {
            "no major stars".to_string()
        } else {
            palace
                .stars
                .iter()
                .map(|star| {
                    let mut label = star.name.clone();
                    if let Some(brightness) = &star.brightness {
                        let _ = write!(label, " ({brightness})");
                    }
                    if let Some(mutagen) = &star.mutagen {
                        let _ = write!(label, " [{mutagen}]");
                    }
                    label
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            prompt,
            "- {} [{}{}]: {}",
            palace.name, palace.stem, palace.branch, stars
        );
    }

    if let Some(overlay) = overlay {
        if !overlay.activations.is_empty() {
            let _ = writeln!(prompt);
            let _ = writeln!(prompt, "Transit activations:");
            for activation in &overlay.activations {
                let _ = write!(prompt, "- {}: {}", activation.palace, activation.stars.join(", "));
                if let Some(note) = &activation.note {
                    let _ = write!(prompt, " ({note})");
                }
                let _ = writeln!(prompt);
            }
        }
    }

    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Write in warm, encouraging prose. Ground every statement in the placements above. Do not invent placements."
    );

    prompt
}

fn scope_instruction(scope: InterpretScope, date: &TransitDate) -> String {
    match scope {
        InterpretScope::Natal => {
            "Write a natal chart reading covering character, strengths, and life themes."
                .to_string()
        }
        InterpretScope::Decade => format!(
            "Write a reading for the decade period containing the year {}.",
            date.year.unwrap_or_default()
        ),
        InterpretScope::Year => format!(
            "Write a reading for the year {}.",
            date.year.unwrap_or_default()
        ),
        InterpretScope::Month => format!(
            "Write a reading for month {} of {}.",
            date.month.unwrap_or_default(),
            date.year.unwrap_or_default()
        ),
        InterpretScope::Day => format!(
            "Write a reading for {}-{:02}-{:02}.",
            date.year.unwrap_or_default(),
            date.month.unwrap_or_default(),
            date.day.unwrap_or_default()
        ),
    }
}
