use crate::commands::OutputFormat;
use colored::*;
use filetypestats_core::category::TOTAL;
use filetypestats_core::FileTypeStats;
use indicatif::HumanBytes;
use std::io::Write;

pub fn write_stats<W: Write>(out: &mut W, stats: &FileTypeStats, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => write_table(out, stats)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, stats)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(out, stats)?,
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, stats: &FileTypeStats) -> std::io::Result<()> {
    for stat in stats.categories() {
        writeln!(
            out,
            "{:>8} {:<8} files taking {:>10} of space  ({})",
            stat.file_count,
            stat.category.cyan(),
            HumanBytes(stat.num_bytes).to_string(),
            stat.path.dimmed(),
        )?;
    }
    if let Some(total) = stats.total() {
        writeln!(
            out,
            "\n{} {} files taking {} of space",
            "Total".bold(),
            total.file_count.to_string().green(),
            HumanBytes(total.num_bytes).to_string().green(),
        )?;
    }
    Ok(())
}

fn write_csv<W: Write>(out: &mut W, stats: &FileTypeStats) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["category", "path", "file_count", "num_bytes"])?;
    // categories first, total last
    for stat in stats.categories().chain(stats.get(TOTAL)) {
        wtr.write_record([
            stat.category.as_str(),
            stat.path.as_str(),
            stat.file_count.to_string().as_str(),
            stat.num_bytes.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetypestats_core::FTypeStat;

    fn sample() -> FileTypeStats {
        FileTypeStats::from_file_stats(
            "/a/**",
            &[
                FTypeStat::single("/a/x.txt", "text", 1500),
                FTypeStat::single("/a/", "dir", 0),
            ],
        )
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_stats(&mut buf, &sample(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "category,path,file_count,num_bytes\n\
             dir,/a/**,1,0\n\
             text,/a/**,1,1500\n\
             total,/a/**,1,1500\n"
        );
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        write_stats(&mut buf, &sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["total"]["numBytes"], 1500);
        assert_eq!(value["dir"]["fileCount"], 1);
    }

    #[test]
    fn test_table_output_mentions_total() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_stats(&mut buf, &sample(), OutputFormat::Table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Total 1 files taking 1.46 KiB of space"));
    }
}
