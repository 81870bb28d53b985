pub mod input;
pub mod rules_file;
pub mod slab_loader;

pub use input::{InputError, MAX_AMOUNT, TaxInput};
pub use rules_file::{RulesFile, RulesFileError};
pub use slab_loader::{SlabLoader, SlabLoaderError, SlabRecord, SlabTable};
