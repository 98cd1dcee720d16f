pub mod comparisons;
pub mod overview;
pub mod panels;
pub mod plot;
pub mod trends;
