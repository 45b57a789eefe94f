extern crate string_cache_codegen;

use std::env;
use std::path::Path;

fn main() {
    string_cache_codegen::AtomType::new("atoms::NameAtom", "name_atom!")
        .atoms(&[
            "bin",
            "bool",
            "float",
            "frame",
            "int",
            "lookup_handler",
            "null",
            "str",
            "template",
        ])
        .atoms(&["entry", "args", "value", "container"])
        .write_to_file(&Path::new(&env::var("OUT_DIR").unwrap()).join("name_atom.rs"))
        .unwrap()
}
