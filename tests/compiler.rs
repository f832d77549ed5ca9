mod common;

use common::{asm_text, assert_in_order, ARITH, BRANCHES, HELLO};
use manv::compiler::{
    self,
    emit::Section,
    model::Literal,
    phases::{
        self,
        types::{Loc, Phase},
    },
    source::Source,
    token::{Keyword, Size, Symbol, Token},
};

fn line_tokens(src: &str) -> Vec<Token> {
    let tokens = phases::tokenize(&Source::new(src)).unwrap();
    tokens.lines[0]
        .tokens
        .iter()
        .map(|tok| tok.value_ref().clone())
        .collect()
}

#[test]
fn const_declaration_tokens() {
    assert_eq!(
        line_tokens("const p[100]: int = 100;"),
        vec![
            Token::Keyword(Keyword::Const),
            Token::Word(String::from("p")),
            Token::Size(Size::Fixed(String::from("100"))),
            Token::Type(String::from("int")),
            Token::Value(String::from("100")),
            Token::Symbol(Symbol::Semicolon),
        ]
    );
}

#[test]
fn var_declaration_tokens() {
    assert_eq!(
        line_tokens("var x: int = 100;"),
        vec![
            Token::Keyword(Keyword::Var),
            Token::Word(String::from("x")),
            Token::Size(Size::Dynamic),
            Token::Type(String::from("int")),
            Token::Value(String::from("100")),
            Token::Symbol(Symbol::Semicolon),
        ]
    );
}

#[test]
fn syscall_with_seven_arguments_is_rejected() {
    let err = compiler::compile("var err: int;\nsyscall 60, 1, 2, 3, 4, 5, 6, 7, err;").unwrap_err();
    assert_eq!(err.phase(), Phase::Tokenize);
    assert_eq!(err.message().loc().map(|loc| loc.line()), Some(2));
}

#[test]
fn multiply_into_fresh_target() {
    let text = asm_text("mul (2, 3) into r;");
    assert_in_order(
        &text,
        &["main:", "mov rax, 2", "mov rbx, 3", "imul rax, rbx", "mov [r], rax", "ret"],
    );
}

#[test]
fn syscall_into_fresh_error_identifier() {
    let text = asm_text("const msg: str = \"Hello World\";\nsyscall 1, 1, msg, 11, err;");
    assert_in_order(
        &text,
        &[
            "main:",
            "mov rax, 1",
            "mov rdi, 1",
            "mov rsi, [msg]",
            "mov rdx, 11",
            "syscall",
            "mov [err], rax",
        ],
    );
}

#[test]
fn doubly_signed_numbers_are_diagnosed() {
    for src in &[
        "var x: int = -0x-8000000000000000;",
        "var x: int = 0x-5;",
        "var x[0b-1]: str;",
        "var b[8]: str;\nsize_inc b, 0x-1;",
    ] {
        assert!(compiler::compile(src).is_err(), "{}", src);
    }
}

#[test]
fn sections_render_in_order() {
    let text = asm_text("var r: int;\nmul (2, 3) into r;");
    assert_in_order(
        &text,
        &[
            "section .data",
            "section .bss",
            "r resq 1",
            "section .text",
            "global _start",
            "_start:",
            "    call main",
            "main:",
            "    mov rax, 2\n    mov rbx, 3\n    imul rax, rbx\n    mov [r], rax\n    ret\n",
        ],
    );
}

#[test]
fn hello_demo() {
    let asm = compiler::compile(HELLO).unwrap();
    assert_eq!(
        asm.get(Section::Data, "msg").unwrap().lines(),
        ["msg db `Hello, World!\\n`, 0"]
    );
    assert_in_order(
        &asm.to_string(),
        &[
            "prints:",
            "main:",
            "    mov rsi, msg\n    mov rdx, 14\n    call prints\n    mov rdi, 0\n    call exit\n",
        ],
    );
}

#[test]
fn arith_demo() {
    assert_in_order(
        &asm_text(ARITH),
        &[
            "a dq 84",
            "b dq 2",
            "r resq 1",
            "main:",
            "    mov rax, [a]\n    mov rcx, [b]\n    xor rdx, rdx\n    idiv rcx\n    mov [r], rax\n",
            "    mov rax, [r]\n    mov rbx, 8\n    add rax, rbx\n",
            "    mov rax, [r]\n    mov rbx, 5\n    sub rax, rbx\n",
            "    mov rax, [r]\n    mov rbx, 2\n    imul rax, rbx\n",
            "    mov rdi, [r]\n    call printi\n",
        ],
    );
}

#[test]
fn branches_demo() {
    let asm = compiler::compile(BRANCHES).unwrap();
    assert_eq!(asm.get(Section::Bss, "buf").unwrap().lines(), ["buf resq 4"]);

    let labels = asm
        .blocks(Section::Text)
        .iter()
        .map(|b| b.label())
        .collect::<Vec<_>>();
    assert_eq!(
        labels[4..],
        ["main", "if_block_0", "else_block_0", "if_block_1", "else_block_1"]
    );

    assert_in_order(
        &asm.to_string(),
        &[
            "__str_0 db `big\\n`, 0",
            "__str_1 db `small\\n`, 0",
            "main:",
            "    cmp qword [x], 2\n    jg .then_0\n    jle .else_0\n",
            "    cmp qword [x], 3\n    je .then_1\n    jne .else_1\n",
            "    mov rax, 39\n    syscall\n    mov [err], rax\n",
            "    mov rdi, [x]\n    call exit\n",
            "if_block_0:",
            "    mov rsi, __str_0\n    mov rdx, 4\n    call prints\n    ret\n",
            "if_block_1:",
            "    mov qword [x], 0\n    ret\n",
        ],
    );
}

#[test]
fn compilations_do_not_share_identifiers() {
    assert!(compiler::compile("var x: int = 1;").is_ok());
    assert!(compiler::compile("var x: int = 2;").is_ok());

    // `x` is only a known identifier within the compilation declaring it.
    let tokens = phases::tokenize(&Source::new("emt x;")).unwrap();
    assert_eq!(
        tokens.lines[0].tokens[1].value_ref(),
        &Token::Word(String::from("x"))
    );
}

#[test]
fn parallel_compilations_agree() {
    let expected = asm_text(BRANCHES);
    let handles = (0..4)
        .map(|_| std::thread::spawn(|| asm_text(BRANCHES)))
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn errors_name_the_phase() {
    let err = compiler::compile("var x: int;\nbogus;").unwrap_err();
    assert_eq!(err.phase(), Phase::Tokenize);
    assert_eq!(err.message().loc(), Some(Loc::new(2, 1)));

    let err = compiler::compile("var x: int = hello;").unwrap_err();
    assert_eq!(err.phase(), Phase::Parse);
    assert!(err.to_string().starts_with("Compilation Error (in Parser): @(line: 1"));

    let err = compiler::compile("var x: float = 1.5;\nadd (x, 1.5) into x;").unwrap_err();
    assert_eq!(err.phase(), Phase::Generate);
    assert!(err.to_string().ends_with("->    2 | add (x, 1.5) into x;\n"));
}

#[test]
fn float_literals_keep_their_value() {
    let program = phases::parse(phases::tokenize(&Source::new("var f: float = 2.5;")).unwrap()).unwrap();
    match program.statements[0].value_ref() {
        manv::compiler::model::Statement::Variable(var) => {
            assert_eq!(var.value, Some(Literal::Float(2.5)))
        }
        stmt => panic!("unexpected {:?}", stmt),
    }
}
