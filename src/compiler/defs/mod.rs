pub(super) mod builtins;
pub(super) mod types;
