pub const DEFAULT_SOURCE_EXT: &str = "mv";
pub const DEFAULT_ASM_EXT: &str = "asm";
pub const DEFAULT_OBJECT_EXT: &str = "o";
