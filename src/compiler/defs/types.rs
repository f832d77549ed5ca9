use crate::compiler::lang::Builder;
use crate::compiler::model::Type;

pub(in crate::compiler) fn register(builder: &mut Builder) {
    builder.register_type("int", Type::Int);
    builder.register_type("float", Type::Float);
    builder.register_type("str", Type::Str);
    builder.register_type("char", Type::Char);
}
