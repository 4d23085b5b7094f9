//! `--list-strategies`: print every accepted strategy name.

use std::io::{self, Write};

use lastmix::pipeline::Preset;
use lastmix::{GroupStrategy, MergeStrategy, OrderStrategy};

type NameTable = &'static [(&'static str, &'static [&'static str])];

/// Writes the name tables to `out`.
pub fn write_strategies<W: Write>(out: &mut W) -> io::Result<()> {
    let sections: [(&str, NameTable); 4] = [
        ("Merge (-m)", MergeStrategy::NAMES),
        ("Group (-g)", GroupStrategy::NAMES),
        ("Sort (-s)", OrderStrategy::NAMES),
        ("Preset (-p)", Preset::NAMES),
    ];

    for (i, (title, names)) in sections.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}:", title)?;
        for (canonical, aliases) in names.iter() {
            writeln!(out, "  {:<22} {}", canonical, aliases.join(", "))?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Windowed merges also accept merge:MxN, slide:MxN and shuffle:MxN.")
}

/// Prints the name tables to standard output.
pub fn run() -> io::Result<()> {
    write_strategies(&mut io::stdout().lock())
}
