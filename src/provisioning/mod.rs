mod account_numbers;

pub use account_numbers::{AccountProvisioner, OpenAccount, RandomSuffix, SuffixSource};
