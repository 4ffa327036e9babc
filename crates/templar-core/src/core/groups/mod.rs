//! Functional-group catalog and the substructure matcher behind it.
//!
//! A functional group is a pattern whose matched atoms are treated as an
//! indivisible cluster when a reaction center is expanded: pulling in one
//! atom of a match pulls in all of them.

pub mod catalog;
pub mod matcher;
