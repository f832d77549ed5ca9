use super::defs;
use super::model::{Function, Type};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static STORAGE: Lazy<Lang> = Lazy::new(Lang::new);

/// The fixed, compilation-independent parts of the language: builtin types and builtin functions.
pub struct Lang {
    types: HashMap<String, Type>,
    functions: Vec<Function>,
    function_index: HashMap<String, usize>,
}

impl Lang {
    fn new() -> Self {
        let mut builder = Builder::new();
        defs::types::register(&mut builder);
        defs::builtins::register(&mut builder);
        builder.build()
    }

    pub fn get() -> &'static Lang {
        Lazy::force(&STORAGE)
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Function> {
        self.function_index
            .get(name)
            .map(|&idx| &self.functions[idx])
    }

    /// Builtin functions, in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }
}

pub struct Builder {
    lang: Lang,
}

impl Builder {
    fn new() -> Self {
        Builder {
            lang: Lang {
                types: HashMap::new(),
                functions: Vec::new(),
                function_index: HashMap::new(),
            },
        }
    }

    fn build(self) -> Lang {
        self.lang
    }

    pub(super) fn register_type(&mut self, name: &str, ty: Type) {
        assert!(self.lang.types.insert(name.to_owned(), ty).is_none());
    }

    pub(super) fn register_function(&mut self, f: Function) {
        let idx = self.lang.functions.len();
        assert!(self
            .lang
            .function_index
            .insert(f.identifier.name.clone(), idx)
            .is_none());
        self.lang.functions.push(f);
    }
}
