//! Offline inference commands

use colored::Colorize;
use risk_inference::{Incident, RiskEngine, RiskLevel};
use serde::Serialize;
use tabled::Tabled;

use super::Context;

#[derive(Debug, Serialize, Tabled)]
pub struct PredictionRow {
    pub day: String,
    pub hour: u8,
    pub injuries: u32,
    pub location: String,
    pub score: f64,
    pub level: RiskLevel,
    pub result: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct VocabRow {
    pub field: &'static str,
    pub label: String,
}

pub fn handle(
    day: String,
    hour: u8,
    injuries: u32,
    location: String,
    ctx: &Context,
) -> Result<(), String> {
    let engine = ctx.load_engine()?;
    let row = score(&engine, Incident { day, hour, injuries, location })?;
    let level = row.level;
    ctx.format.print(std::slice::from_ref(&row));
    if matches!(ctx.format, crate::output::OutputFormat::Table) {
        let label = match level {
            RiskLevel::Low => level.as_str().green(),
            RiskLevel::Medium => level.as_str().yellow(),
            RiskLevel::High => level.as_str().red().bold(),
        };
        println!("Risk: {}", label);
    }
    Ok(())
}

pub fn vocab(ctx: &Context) -> Result<(), String> {
    let engine = ctx.load_engine()?;
    ctx.format.print(&vocabulary(&engine));
    Ok(())
}

pub fn score(engine: &RiskEngine, incident: Incident) -> Result<PredictionRow, String> {
    let assessment = engine.predict_risk(&incident).map_err(|e| e.to_string())?;
    Ok(PredictionRow {
        day: incident.day,
        hour: incident.hour,
        injuries: incident.injuries,
        location: incident.location,
        score: assessment.score,
        level: assessment.level,
        result: assessment.result_string(),
    })
}

pub fn vocabulary(engine: &RiskEngine) -> Vec<VocabRow> {
    let days = engine.known_days().iter().map(|d| VocabRow { field: "day", label: d.clone() });
    let locations =
        engine.known_locations().iter().map(|l| VocabRow { field: "location", label: l.clone() });
    days.chain(locations).collect()
}
