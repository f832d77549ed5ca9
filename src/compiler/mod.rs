pub mod emit;
pub mod lang;
pub mod model;
pub mod phases;
pub mod source;
pub mod token;

mod defs;

pub use phases::types::Error;

use emit::Asm;
use log::info;
use source::Source;

pub fn compile(text: &str) -> Result<Asm, Error> {
    compile_source(&Source::new(text))
}

pub fn compile_lines<I, S>(lines: I) -> Result<Asm, Error>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    compile_source(&Source::from_lines(lines))
}

pub fn compile_source(source: &Source) -> Result<Asm, Error> {
    info!("compiling {} line(s)", source.len());

    run_phases(source).map_err(|err| err.in_context(source))
}

fn run_phases(source: &Source) -> Result<Asm, Error> {
    let tokens = phases::tokenize(source)?;
    let program = phases::parse(tokens)?;
    let asm = phases::generate(program)?;

    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::phases::types::{Loc, Phase};
    use super::{compile, compile_lines};

    #[test]
    fn reports_phase_and_context() {
        let err = compile("var x: int;\nvar y: int").unwrap_err();
        assert_eq!(err.phase(), Phase::Tokenize);
        assert_eq!(err.message().loc(), Some(Loc::new(2, 11)));
        assert_eq!(
            err.to_string(),
            "Compilation Error (in Lexer): @(line: 2, col: 11): Expected a ';' at the end of the line\n\
             \x20     1 | var x: int;\n\
             ->    2 | var y: int\n"
        );
    }

    #[test]
    fn generator_errors_carry_context() {
        let err = compile("var r: int;\ndel r;\nemt r;").unwrap_err();
        assert_eq!(err.phase(), Phase::Generate);
        assert_eq!(err.snippet().to_string(), "      2 | del r;\n->    3 | emt r;\n");
    }

    #[test]
    fn lines_and_text_agree() {
        let text = "var r: int;\nmul (2, 3) into r;\nprinti(r);";
        assert_eq!(
            compile(text).unwrap(),
            compile_lines(text.lines()).unwrap()
        );
    }
}
