//! Parameter listing command.

use clap::Args;
use coro_harmonizer::{ChordQuality, HarmonizerParam};

#[derive(Args)]
pub struct ParamsArgs {
    /// Also list the chord table entries
    #[arg(long)]
    chords: bool,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    println!("Harmonizer Parameters");
    println!("=====================\n");
    println!(
        "{:>4}  {:<14} {:<16} {:>7} {:>7} {:>8}  {:<5} Group",
        "Addr", "Id", "Name", "Min", "Max", "Default", "Unit"
    );

    for param in HarmonizerParam::NAMED {
        let desc = param.descriptor();
        println!(
            "{:>4}  {:<14} {:<16} {:>7} {:>7} {:>8}  {:<5} {}",
            param.address(),
            desc.string_id,
            desc.name,
            desc.min,
            desc.max,
            desc.default,
            desc.unit.suffix().trim(),
            desc.group
        );
    }

    if args.chords {
        let unit = HarmonizerParam::ChordEntry {
            quality: ChordQuality::Major,
            degree: 0,
            voice: 0,
        }
        .descriptor()
        .unit;
        println!("\nChord Tables (voices 0-3, unit: {})", unit.suffix().trim());
        println!("-----------------------------------");
        for quality in ChordQuality::ALL {
            for degree in 0..12u8 {
                let row: Vec<String> = (0..4u8)
                    .map(|voice| {
                        let entry = HarmonizerParam::ChordEntry {
                            quality,
                            degree,
                            voice,
                        };
                        format!("{:>3}", entry.descriptor().default)
                    })
                    .collect();
                let first = HarmonizerParam::ChordEntry {
                    quality,
                    degree,
                    voice: 0,
                };
                println!(
                    "{:>4}  {:<6} degree {:>2}: {}",
                    first.address(),
                    quality.name(),
                    degree,
                    row.join(" ")
                );
            }
        }
    } else {
        println!("\nUse --chords to list the chord table entries.");
    }

    Ok(())
}
