//! Example: packing a word list and querying the packed bytes.
//!
//! Builds a small list, looks words up, enumerates it, and prints the build
//! statistics including the edge count and label length histograms.
//!
//! Run with: cargo run --example wordlist

use packed_dawg::dawg::{build_wordlist, BuildStats, DecodeError, WordList};

fn print_histogram(title: &str, histogram: &[usize]) {
    println!("\n{title}:");
    let widest = histogram.iter().copied().max().unwrap_or(0).max(1);
    for (n, &count) in histogram.iter().enumerate() {
        let bar = "#".repeat((count * 40).div_ceil(widest));
        println!("  {n:>3} {count:>6} {bar}");
    }
}

fn print_stats(stats: &BuildStats) {
    println!("\nBuild statistics:");
    println!("  words          {}", stats.words);
    println!("  trie nodes     {}", stats.trie_nodes);
    println!("  graph nodes    {}", stats.dag_nodes);
    println!("  merge rounds   {}", stats.dedup_rounds);
    println!("  merged edges   {}", stats.merged_edges);
    println!("  slots          {} ({} overflow)", stats.slots, stats.overflow_slots);
    println!("  bytes          {}", stats.bytes);
    print_histogram("Edges per node", &stats.edge_histogram);
    print_histogram("Label length", &stats.label_histogram);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let words = [
        "BAKE", "BAKED", "BAKER", "BAKES", "CAKE", "CAKED", "CAKES", "FAKE", "FAKED", "FAKER",
        "FAKES", "LAKE", "LAKES", "MAKE", "MAKER", "MAKES", "TAKE", "TAKEN", "TAKER", "TAKES",
    ];
    let packed = build_wordlist(words)?;
    let list = packed.word_list()?;

    println!("Word lookup:");
    for word in ["BAKE", "BAKER", "BAK", "CAKES", "LAKED", "TAKEN", "WAKE"] {
        println!("  {word}: {}", if list.contains(word) { "yes" } else { "no" });
    }

    let all: Vec<String> = list
        .words()
        .map(|w| String::from_utf8_lossy(&w).into_owned())
        .collect();
    println!("\nAll words: {all:?}");

    print_stats(packed.stats());

    // The container keeps the layout with the records.
    let file = packed.to_container()?;
    let reopened = WordList::from_container(&file)?;
    println!(
        "\nContainer: {} bytes, {} slots, deepest path {} records",
        file.len(),
        reopened.slot_count(),
        reopened.max_depth()
    );

    let mut corrupt = file.clone();
    if let Some(last) = corrupt.last_mut() {
        *last ^= 0x5a;
    }
    match WordList::from_container(&corrupt) {
        Err(DecodeError::ChecksumMismatch { stored, computed }) => {
            println!("Corrupted copy rejected: stored crc {stored:#010x}, computed {computed:#010x}")
        }
        other => println!("Corrupted copy: {other:?}"),
    }
    Ok(())
}
