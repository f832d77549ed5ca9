use enum_map::{Enum, EnumMap};
use std::fmt::Display;
use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, EnumIter, StrumDisplay)]
pub enum Section {
    #[strum(serialize = "data")]
    Data,
    #[strum(serialize = "bss")]
    Bss,
    #[strum(serialize = "text")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    label: String,
    lines: Vec<String>,
}

impl Block {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn push<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }
}

/// Assembly accumulated per section as labelled, append-only blocks.
///
/// Blocks render in the order their labels were first used, and sections always render as
/// data, bss, then text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Asm {
    sections: EnumMap<Section, Vec<Block>>,
}

impl Asm {
    pub fn new() -> Self {
        Asm::default()
    }

    pub fn contains(&self, section: Section, label: &str) -> bool {
        self.sections[section].iter().any(|b| b.label == label)
    }

    pub fn blocks(&self, section: Section) -> &[Block] {
        &self.sections[section]
    }

    pub fn get(&self, section: Section, label: &str) -> Option<&Block> {
        self.sections[section].iter().find(|b| b.label == label)
    }

    /// The block under `label`, created empty at the end of the section if it doesn't exist yet.
    pub fn block(&mut self, section: Section, label: &str) -> &mut Block {
        let blocks = &mut self.sections[section];
        let idx = match blocks.iter().position(|b| b.label == label) {
            Some(idx) => idx,
            None => {
                blocks.push(Block {
                    label: label.to_owned(),
                    lines: Vec::new(),
                });
                blocks.len() - 1
            }
        };
        &mut blocks[idx]
    }

    pub fn push<S: Into<String>>(&mut self, section: Section, label: &str, line: S) {
        self.block(section, label).push(line);
    }

    pub fn extend<I, S>(&mut self, section: Section, label: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let block = self.block(section, label);
        for line in lines {
            block.push(line);
        }
    }

    /// Swap out the contents of a block, keeping its position.
    pub fn replace<I, S>(&mut self, section: Section, label: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let block = self.block(section, label);
        block.lines = lines.into_iter().map(Into::into).collect();
    }

    fn is_unindented(line: &str) -> bool {
        line.ends_with(':') || line.starts_with("global ") || line.starts_with("extern ")
    }
}

impl Display for Asm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, section) in Section::iter().enumerate() {
            if idx != 0 {
                writeln!(f)?;
            }
            writeln!(f, "section .{}", section)?;

            for block in self.sections[section].iter() {
                writeln!(f)?;
                writeln!(f, "; -- {} --", block.label)?;
                for line in block.lines.iter() {
                    if section != Section::Text || Asm::is_unindented(line) {
                        writeln!(f, "{}", line)?;
                    } else {
                        writeln!(f, "    {}", line)?;
                    }
                }
            }
        }
        Ok(())
    }
}
