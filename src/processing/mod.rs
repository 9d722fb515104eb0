pub mod bank;
pub mod classify;
pub mod layout;
pub mod mrz;
pub mod orient;
pub mod passport;
pub mod tables;

pub use bank::BankPipeline;
pub use classify::Classifier;
pub use layout::LayoutReconstructor;
pub use mrz::MrzParser;
pub use orient::OrientationCorrector;
pub use passport::PassportReader;
pub use tables::TableMerger;
