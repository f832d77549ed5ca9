use manv::compiler;

pub const HELLO: &str = include_str!("../../demos/hello.mv");
pub const ARITH: &str = include_str!("../../demos/arith.mv");
pub const BRANCHES: &str = include_str!("../../demos/branches.mv");

pub fn asm_text(src: &str) -> String {
    match compiler::compile(src) {
        Ok(asm) => asm.to_string(),
        Err(err) => panic!("{}", err),
    }
}

/// Each needle must appear in `haystack`, after the previous one.
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut rest = haystack;
    for needle in needles {
        match rest.find(needle) {
            Some(idx) => rest = &rest[idx + needle.len()..],
            None => panic!("'{}' missing (in order) from:\n{}", needle, haystack),
        }
    }
}
