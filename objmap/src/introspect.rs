//! Candidate members of a type
//!
//! Readable members are mapping sources; writable members are targets. Both
//! keep declaration order.

use crate::reflect::{MemberInfo, TypeInfo};

/// Members that can be read (candidate sources)
pub fn source_members(info: &'static TypeInfo) -> impl Iterator<Item = &'static MemberInfo> {
    info.members().iter().filter(|m| m.is_readable())
}

/// Members that can be written (candidate targets)
pub fn target_members(info: &'static TypeInfo) -> impl Iterator<Item = &'static MemberInfo> {
    info.members().iter().filter(|m| m.is_writable())
}
