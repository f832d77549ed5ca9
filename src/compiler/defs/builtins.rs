use crate::compiler::lang::Builder;
use crate::compiler::model::{Argument, Function, Identifier, Literal, Register, Type};

fn prebaked(label: &str, body: &[&str]) -> Option<Vec<String>> {
    Some(
        std::iter::once(format!("{}:", label))
            .chain(body.iter().map(|line| (*line).to_owned()))
            .collect(),
    )
}

fn builtin(name: &str, arguments: Vec<Argument>, body: &[&str]) -> Function {
    Function {
        identifier: Identifier::new(name),
        arguments,
        prebaked: prebaked(name, body),
    }
}

fn argument(name: &str, ty: Type, default: Option<Literal>, register: Register) -> Argument {
    Argument {
        identifier: Identifier::new(name),
        ty,
        default,
        register,
    }
}

pub(in crate::compiler) fn register(builder: &mut Builder) {
    // exit(code = 0): sys_exit with the status already in rdi.
    builder.register_function(builtin(
        "exit",
        vec![argument(
            "code",
            Type::Int,
            Some(Literal::Number(0)),
            Register::Rdi,
        )],
        &["mov rax, 60", "syscall"],
    ));

    // printi(n): signed decimal rendering of rdi plus a newline, built backwards in a stack buffer.
    builder.register_function(builtin(
        "printi",
        vec![argument(
            "n",
            Type::Multi(vec![Type::Int, Type::Float]),
            None,
            Register::Rdi,
        )],
        &[
            "push rbx",
            "sub rsp, 32",
            "mov rax, rdi",
            "lea rsi, [rsp + 31]",
            "mov byte [rsi], 10",
            "mov rcx, 1",
            "mov rbx, 10",
            "xor r8, r8",
            "test rax, rax",
            "jns .digits",
            "neg rax",
            "mov r8, 1",
            ".digits:",
            "xor rdx, rdx",
            "div rbx",
            "add dl, '0'",
            "dec rsi",
            "mov [rsi], dl",
            "inc rcx",
            "test rax, rax",
            "jnz .digits",
            "test r8, r8",
            "jz .write",
            "dec rsi",
            "mov byte [rsi], '-'",
            "inc rcx",
            ".write:",
            "mov rax, 1",
            "mov rdi, 1",
            "mov rdx, rcx",
            "syscall",
            "add rsp, 32",
            "pop rbx",
            "ret",
        ],
    ));

    // prints(char_seq, length): sys_write to stdout, buffer in rsi and length in rdx.
    builder.register_function(builtin(
        "prints",
        vec![
            argument(
                "char_seq",
                Type::Multi(vec![Type::Str, Type::Char]),
                None,
                Register::Rsi,
            ),
            argument("length", Type::Int, None, Register::Rdx),
        ],
        &["mov rax, 1", "mov rdi, 1", "syscall", "ret"],
    ));
}
