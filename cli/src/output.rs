//! Output formatting

use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

impl OutputFormat {
    pub fn print<T: Serialize + Tabled>(&self, rows: &[T]) {
        println!("{}", self.render(rows));
    }

    pub fn render<T: Serialize + Tabled>(&self, rows: &[T]) -> String {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(rows).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(rows).unwrap_or_default(),
            OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        }
    }
}
