use anyhow::{bail, Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The external assembler and linker which turn emitted assembly into an ELF executable.
#[derive(Debug, Clone)]
pub struct Toolchain {
    nasm: PathBuf,
    ld: PathBuf,
}

fn invoke(cmd: &mut Command) -> Result<()> {
    debug!("running {:?}", cmd);

    let output = cmd
        .output()
        .with_context(|| format!("could not launch {:?}", cmd))?;

    if !output.status.success() {
        bail!(
            "{:?} failed ({}):\n{}",
            cmd,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }

    Ok(())
}

impl Toolchain {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(nasm: P, ld: Q) -> Self {
        Toolchain {
            nasm: nasm.into(),
            ld: ld.into(),
        }
    }

    pub fn assemble(&self, asm: &Path, object: &Path) -> Result<()> {
        invoke(
            Command::new(&self.nasm)
                .args(&["-f", "elf64", "-o"])
                .arg(object)
                .arg(asm),
        )
    }

    pub fn link(&self, object: &Path, binary: &Path) -> Result<()> {
        invoke(
            Command::new(&self.ld)
                .args(&["-s", "-o"])
                .arg(binary)
                .arg(object),
        )
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain::new("nasm", "ld")
    }
}
