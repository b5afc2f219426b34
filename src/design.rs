// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::parse::{BlockFile, NetDecl, parse_blocks, parse_nets};
use crate::{Block, FloorplanError, Net, Outline, ParseError, PinRef, Rect, Terminal};

/// Everything loaded from the input files. Blocks here hold their initial
/// dimensions; the search works on copies of the block array.
#[derive(Debug, Clone)]
pub struct Design {
    outline: Outline,
    blocks: Vec<Block>,
    terminals: Vec<Terminal>,
    nets: Vec<Net>,
    names: IndexMap<String, PinRef>,
}

impl Design {
    pub fn new(outline: Outline, blocks: Vec<Block>, terminals: Vec<Terminal>) -> Self {
        let mut names = IndexMap::new();
        // terminals shadow blocks of the same name
        let entries = terminals
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name(), PinRef::Terminal(i)))
            .chain(
                blocks
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (b.name(), PinRef::Block(i))),
            );
        for (name, pin) in entries {
            match names.entry(name.to_string()) {
                Entry::Occupied(existing) => {
                    log::warn!(
                        "Duplicate name '{}': keeping {:?}, ignoring {:?}",
                        name,
                        existing.get(),
                        pin
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(pin);
                }
            }
        }

        Design {
            outline,
            blocks,
            terminals,
            nets: Vec::new(),
            names,
        }
    }

    /// Parses block and net descriptions held in memory.
    pub fn from_strs(block_src: &str, net_src: &str) -> Result<Self, ParseError> {
        let BlockFile {
            outline,
            blocks,
            terminals,
        } = parse_blocks(block_src)?;
        let mut design = Design::new(outline, blocks, terminals);
        for decl in parse_nets(net_src)? {
            design.add_net_decl(&decl);
        }
        Ok(design)
    }

    /// Reads and parses a block file and a net file.
    pub fn from_files(
        block_path: impl AsRef<Path>,
        net_path: impl AsRef<Path>,
    ) -> Result<Self, FloorplanError> {
        let block_path = block_path.as_ref();
        let net_path = net_path.as_ref();
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| FloorplanError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let block_src = read(block_path)?;
        let net_src = read(net_path)?;

        let BlockFile {
            outline,
            blocks,
            terminals,
        } = parse_blocks(&block_src).map_err(|source| FloorplanError::Parse {
            path: block_path.to_path_buf(),
            source,
        })?;
        let mut design = Design::new(outline, blocks, terminals);
        let decls = parse_nets(&net_src).map_err(|source| FloorplanError::Parse {
            path: net_path.to_path_buf(),
            source,
        })?;
        for decl in &decls {
            design.add_net_decl(decl);
        }
        design.log_summary();
        Ok(design)
    }

    fn add_net_decl(&mut self, decl: &NetDecl) {
        let names = decl.pins.iter().map(String::as_str).collect::<Vec<_>>();
        let dropped = self.connect(&names);
        for name in dropped {
            log::warn!(
                "Net at line {}: dropping unknown pin '{}'",
                decl.line,
                name
            );
        }
    }

    /// Adds a net over the named terminals/blocks. Unknown names are left out
    /// of the net and returned.
    pub fn connect<'a>(&mut self, names: &[&'a str]) -> Vec<&'a str> {
        let mut net = Net::default();
        let mut dropped = Vec::new();
        for &name in names {
            match self.lookup(name) {
                Some(pin) => net.add_pin(pin),
                None => dropped.push(name),
            }
        }
        self.nets.push(net);
        dropped
    }

    pub fn lookup(&self, name: &str) -> Option<PinRef> {
        self.names.get(name).copied()
    }

    pub fn outline(&self) -> Outline {
        self.outline
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    /// Rectangle of a pin, taking block positions from `blocks` rather than
    /// from the design's own (unplaced) block table.
    pub fn pin_rect(&self, pin: PinRef, blocks: &[Block]) -> Rect {
        match pin {
            PinRef::Block(id) => blocks[id].rect(),
            PinRef::Terminal(id) => self.terminals[id].rect(),
        }
    }

    pub fn total_block_area(&self) -> i64 {
        self.blocks.iter().map(Block::area).sum()
    }

    pub fn log_summary(&self) {
        log::debug!(
            "Design: outline {}x{}, {} blocks (area {}), {} terminals, {} nets",
            self.outline.width,
            self.outline.height,
            self.blocks.len(),
            self.total_block_area(),
            self.terminals.len(),
            self.nets.len()
        );
        for net in &self.nets {
            log::trace!("  net of degree {}: {:?}", net.degree(), net.pins());
        }
    }
}
