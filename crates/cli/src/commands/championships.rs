use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use hero_edge_data::{championship_counts, load_corpus, ChampionshipCount};

/// Arguments for the championships command.
#[derive(Args, Debug, Clone)]
pub struct ChampionshipsArgs {
    /// Match corpus CSV
    #[arg(long)]
    pub matches: PathBuf,
}

fn format_table(rows: &[ChampionshipCount]) -> String {
    let width = rows
        .iter()
        .map(|r| r.championship.len())
        .max()
        .unwrap_or(0)
        .max("Championship".len());
    let mut output = String::new();
    output.push_str(&format!("{:<width$}  {:>7}\n", "Championship", "Matches"));
    output.push_str(&format!("{}\n", "-".repeat(width + 9)));
    for row in rows {
        output.push_str(&format!("{:<width$}  {:>7}\n", row.championship, row.matches));
    }
    output
}

pub fn run_championships(args: &ChampionshipsArgs) -> Result<()> {
    let (records, skips) = load_corpus(&args.matches)?;
    let rows = championship_counts(&records);
    print!("{}", format_table(&rows));
    println!("\n{} matches, {} championships ({skips})", records.len(), rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_names() {
        let rows = vec![
            ChampionshipCount {
                championship: "The International".into(),
                matches: 120,
            },
            ChampionshipCount {
                championship: "DPC".into(),
                matches: 7,
            },
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Championship"));
        assert!(lines[2].ends_with("    120"));
        assert!(lines[3].starts_with("DPC "));
        assert_eq!(lines[2].len(), lines[3].len());
    }
}
