#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use unpyc_core::DialectId;
use unpyc_syntax::code::{CodeObject, Constant};
use unpyc_syntax::grammar::GrammarRepository;
use unpyc_syntax::{parser, scanner};

fn repository() -> Option<&'static GrammarRepository> {
    static REPO: OnceLock<Option<GrammarRepository>> = OnceLock::new();
    REPO.get_or_init(|| GrammarRepository::new().ok()).as_ref()
}

fuzz_target!(|data: &[u8]| {
    // First byte picks the dialect, the rest is the code body
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let dialect = DialectId::ALL[selector as usize % DialectId::ALL.len()];
    let code = CodeObject::new(dialect, "<fuzz>", body.to_vec())
        .with_consts(vec![Constant::None, Constant::Int(1), Constant::Str("s".into())])
        .with_names(["a", "b", "c"])
        .with_varnames(["x", "y"])
        .with_cellvars(["z"]);
    // Decoding errors are expected; the scanner and parser must simply not panic
    if let (Ok(scanned), Some(repo)) = (scanner::scan(&code), repository()) {
        let _ = parser::parse_tokens(&scanned, repo);
    }
});
