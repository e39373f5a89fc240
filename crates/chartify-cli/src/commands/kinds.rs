//! Kinds command - show the transformer chain

use chartify_convert::Transformer;
use console::style;

use crate::error::Result;

pub fn run() -> Result<()> {
    println!();
    println!("  {}", style("Transformers").bold());
    println!("  {}", style("────────────").dim());

    for (i, transformer) in Transformer::DEFAULT_ORDER.iter().enumerate() {
        println!(
            "  {} {}",
            style(format!("{:>2}.", i + 1)).dim(),
            style(transformer.name()).cyan().bold()
        );
        for kind in transformer.kinds() {
            println!("      {} {}", style("→").green(), kind);
        }
    }

    println!();
    println!(
        "  {}",
        style("Other kinds are copied into the chart unchanged").dim()
    );
    println!();
    Ok(())
}
