use super::{source, toolchain::Toolchain};
use crate::compiler::{self, emit::Asm};
use crate::assets;
use ansi_term::Colour::Red;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use structopt::StructOpt;

pub fn terminal_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    enable_ansi();
}

#[cfg(windows)]
fn enable_ansi() {
    if ansi_term::enable_ansi_support().is_err() {
        warn!("could not enable terminal ANSI support");
    }
}

#[cfg(not(windows))]
fn enable_ansi() {}

pub fn compile_path(path: &Path, workers: usize) -> Result<Asm> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(assets::DEFAULT_SOURCE_EXT) {
        warn!(
            "'{}' does not have the '.{}' extension",
            path.display(),
            assets::DEFAULT_SOURCE_EXT
        );
    }

    let source = source::read_source(path, workers)?;
    Ok(compiler::compile_source(&source)?)
}

fn stem_with_extension(path: &Path, ext: &str) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .with_context(|| format!("'{}' does not name a file", path.display()))?;
    Ok(PathBuf::from(stem).with_extension(ext))
}

#[derive(StructOpt, Debug)]
#[structopt(name = "manv")]
pub enum CommandRoot {
    /// Compile a source file to NASM assembly.
    Asm(SubcommandAsm),
    /// Compile, assemble and link a source file into an executable.
    Build(SubcommandBuild),
    /// Build a source file, then run the executable.
    Run(SubcommandRun),
}

#[derive(StructOpt, Debug)]
struct ReadOpts {
    /// Number of worker threads reading the source file.
    #[structopt(short, long, default_value = "3")]
    threads: usize,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "manvc")]
pub struct SubcommandAsm {
    #[structopt(name = "in.mv", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(name = "out.asm", parse(from_os_str))]
    out_asm: Option<PathBuf>,

    #[structopt(flatten)]
    read_opts: ReadOpts,
}

#[derive(StructOpt, Debug)]
struct BuildOpts {
    /// Path of the linked executable.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(long, default_value = "nasm", parse(from_os_str))]
    nasm: PathBuf,

    #[structopt(long, default_value = "ld", parse(from_os_str))]
    ld: PathBuf,

    /// Keep the generated assembly and object files.
    #[structopt(short, long)]
    keep_intermediates: bool,
}

#[derive(StructOpt, Debug)]
pub struct SubcommandBuild {
    #[structopt(name = "in.mv", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(flatten)]
    build_opts: BuildOpts,

    #[structopt(flatten)]
    read_opts: ReadOpts,
}

#[derive(StructOpt, Debug)]
pub struct SubcommandRun {
    #[structopt(name = "in.mv", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(flatten)]
    build_opts: BuildOpts,

    #[structopt(flatten)]
    read_opts: ReadOpts,

    /// Arguments handed to the executable.
    #[structopt(name = "args", last = true)]
    args: Vec<String>,
}

fn exit_with(status: Result<i32>) -> ! {
    match status {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}", Red.paint(format!("{:#}", err)));
            std::process::exit(1);
        }
    }
}

pub fn root(cmd: CommandRoot) -> ! {
    match cmd {
        CommandRoot::Asm(scmd) => asm(scmd),
        CommandRoot::Build(scmd) => build(scmd),
        CommandRoot::Run(scmd) => run(scmd),
    };
}

fn write_asm(cmd: &SubcommandAsm) -> Result<PathBuf> {
    let asm = compile_path(&cmd.in_src, cmd.read_opts.threads)?;

    let out_name = match &cmd.out_asm {
        Some(outfile) => outfile.clone(),
        None => stem_with_extension(&cmd.in_src, assets::DEFAULT_ASM_EXT)?,
    };

    std::fs::write(&out_name, asm.to_string())
        .with_context(|| format!("could not write '{}'", out_name.display()))?;

    info!("wrote '{}'", out_name.display());
    Ok(out_name)
}

fn build_binary(in_src: &Path, opts: &BuildOpts, read_opts: &ReadOpts) -> Result<PathBuf> {
    let asm = compile_path(in_src, read_opts.threads)?;

    let binary = match &opts.output {
        Some(output) => output.clone(),
        None => stem_with_extension(in_src, "")?,
    };
    let asm_path = binary.with_extension(assets::DEFAULT_ASM_EXT);
    let object_path = binary.with_extension(assets::DEFAULT_OBJECT_EXT);

    std::fs::write(&asm_path, asm.to_string())
        .with_context(|| format!("could not write '{}'", asm_path.display()))?;

    let toolchain = Toolchain::new(&opts.nasm, &opts.ld);
    toolchain.assemble(&asm_path, &object_path)?;
    toolchain.link(&object_path, &binary)?;

    if !opts.keep_intermediates {
        for path in &[&asm_path, &object_path] {
            std::fs::remove_file(path)
                .with_context(|| format!("could not remove '{}'", path.display()))?;
        }
    }

    info!("built '{}'", binary.display());
    Ok(binary)
}

fn build_and_run(cmd: &SubcommandRun) -> Result<i32> {
    let binary = build_binary(&cmd.in_src, &cmd.build_opts, &cmd.read_opts)?;

    // A bare file name would otherwise be looked up on `PATH`.
    let binary = if binary.is_relative() {
        Path::new(".").join(binary)
    } else {
        binary
    };

    let status = Command::new(&binary)
        .args(&cmd.args)
        .status()
        .with_context(|| format!("could not run '{}'", binary.display()))?;

    info!("'{}' exited with {}", binary.display(), status);
    Ok(status.code().unwrap_or(1))
}

pub fn asm(cmd: SubcommandAsm) -> ! {
    exit_with(write_asm(&cmd).map(|_| 0))
}

pub fn build(cmd: SubcommandBuild) -> ! {
    exit_with(build_binary(&cmd.in_src, &cmd.build_opts, &cmd.read_opts).map(|_| 0))
}

pub fn run(cmd: SubcommandRun) -> ! {
    exit_with(build_and_run(&cmd))
}

#[cfg(test)]
mod tests {
    use super::{stem_with_extension, CommandRoot};
    use std::path::{Path, PathBuf};
    use structopt::StructOpt;

    #[test]
    fn default_output_names() {
        assert_eq!(
            stem_with_extension(Path::new("dir/hello.mv"), "asm").unwrap(),
            PathBuf::from("hello.asm")
        );
        assert_eq!(
            stem_with_extension(Path::new("hello.mv"), "").unwrap(),
            PathBuf::from("hello")
        );
        assert!(stem_with_extension(Path::new(".."), "asm").is_err());
    }

    #[test]
    fn parses_build_options() {
        let cmd = CommandRoot::from_iter_safe(&[
            "manv", "build", "prog.mv", "-o", "out", "--threads", "5", "--nasm", "/opt/nasm", "-k",
        ])
        .unwrap();

        match cmd {
            CommandRoot::Build(build) => {
                assert_eq!(build.in_src, PathBuf::from("prog.mv"));
                assert_eq!(build.build_opts.output, Some(PathBuf::from("out")));
                assert_eq!(build.build_opts.nasm, PathBuf::from("/opt/nasm"));
                assert_eq!(build.build_opts.ld, PathBuf::from("ld"));
                assert!(build.build_opts.keep_intermediates);
                assert_eq!(build.read_opts.threads, 5);
            }
            cmd => panic!("unexpected {:?}", cmd),
        }
    }

    #[test]
    fn run_forwards_trailing_args() {
        let cmd = CommandRoot::from_iter_safe(&["manv", "run", "prog.mv", "--", "a", "b"]).unwrap();
        match cmd {
            CommandRoot::Run(run) => {
                assert_eq!(run.args, vec!["a", "b"]);
                assert_eq!(run.read_opts.threads, 3);
            }
            cmd => panic!("unexpected {:?}", cmd),
        }
    }
}
