//! Terminal output formatting.

use colored::Colorize;
use pricescan_core::AnalysisResult;

/// Print an analysis result as a readable summary.
pub fn print_result(result: &AnalysisResult) {
    println!("{} {}", result.name.cyan().bold(), format!("({})", result.category).dimmed());
    println!("{}", result.price.green().bold());
    println!("{}", result.price_note.dimmed());
    println!();
    println!("{}", result.description);
    println!();

    let details = [
        ("Origin", &result.origin),
        ("Brand", &result.brand),
        ("Material", &result.material),
        ("Usage", &result.usage),
        ("Size", &result.size),
        ("Weight", &result.weight),
        ("Warranty", &result.warranty),
        ("Durability", &result.durability),
        ("Maintenance", &result.maintenance),
        ("Availability", &result.availability),
    ];
    for (label, value) in details {
        println!("{:<13} {}", format!("{label}:").bold(), value);
    }

    println!();
    println!(
        "{} {}   {} {}",
        "Popularity:".bold(),
        score_bar(result.popularity_score),
        "Eco:".bold(),
        score_bar(result.eco_score)
    );

    if !result.tips.is_empty() {
        println!();
        println!("{}", "Tips".bold());
        for (i, tip) in result.tips.iter().enumerate() {
            println!("  {}. {}", i + 1, tip);
        }
    }

    if !result.related_items.is_empty() {
        println!();
        println!("{}", "Related".bold());
        for item in &result.related_items {
            println!("  {} {}", item.icon, item.name);
        }
    }

    let links = &result.purchase_links;
    if !links.online.is_empty() || !links.offline.is_empty() {
        println!();
        println!("{}", "Where to buy".bold());
        for listing in &links.online {
            if listing.search_term.is_empty() {
                println!("  {}", listing.platform);
            } else {
                println!("  {} {}", listing.platform, format!("\"{}\"", listing.search_term).dimmed());
            }
        }
        for place in &links.offline {
            println!("  {}", place);
        }
    }
}

fn score_bar(score: u8) -> String {
    let filled = (score as usize).div_ceil(10);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled.min(10)));
    let colored = match score {
        0..=39 => bar.red(),
        40..=69 => bar.yellow(),
        _ => bar.green(),
    };
    format!("{} {:>3}", colored, score)
}
