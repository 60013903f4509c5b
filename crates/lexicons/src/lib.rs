//! Kit Lexicons: extension vocabularies for the kit control language
//!
//! Each lexicon is installed by running its loader word, so a script only pays
//! for the words it asks for:
//!
//! ```text
//! lex-sequence   [ ] len map sort
//! lex-records    record @field          (loads lex-sequence)
//! lex-trees      forest                 (loads lex-sequence, lex-records)
//! ```
//!
//! Lexicons use only the public `kit_core` API: they register words, store
//! their data behind `CustomValue`, and register a printer per type tag.

pub mod records;
pub mod sequence;
pub mod trees;

pub use records::Record;
pub use sequence::Sequence;
pub use trees::{Forest, ForestNode, build_forest};

use kit_core::{Interpreter, Result, Routine};
use tracing::debug;

const LOADERS: &[(&str, Routine)] = &[
    ("lex-sequence", sequence::add_sequence_lexicon as Routine),
    ("lex-records", records::add_records_lexicon as Routine),
    ("lex-trees", trees::add_trees_lexicon as Routine),
];

/// Register the `lex-*` loader words
pub fn hook_up_extensions(interp: &mut Interpreter) {
    for (word, loader) in LOADERS {
        debug!(lexicon = word, "hook up");
        interp.define_word(word, *loader);
    }
}

/// Run `loader` unless `word` is already defined
pub(crate) fn ensure_loaded(interp: &mut Interpreter, word: &str, loader: &str) -> Result<()> {
    if interp.dictionary().lookup(word).is_none() {
        debug!(loader, "loading dependency");
        interp.run_string(loader)?;
    }
    Ok(())
}
