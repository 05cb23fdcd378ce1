//! Procedure catalog
//!
//! Every procedure the client may invoke, with its Lua source embedded at
//! compile time.

use std::fmt;
use std::str::FromStr;

use crate::error::LuaKvError;

/// A server-side procedure shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    RenameKey,
    RemoveAllKeys,
    RpushHelper,
    GetHelper,
    DeleteWithReturning,
    UnlinkWithReturning,
    SetNotArrayHelper,
    SetKeysTtl,
    DropKeysTtl,
    AppendValueToArray,
    MassRemoveWithReport,
    ExistingKeys,
}

impl Procedure {
    pub const ALL: [Procedure; 12] = [
        Procedure::RenameKey,
        Procedure::RemoveAllKeys,
        Procedure::RpushHelper,
        Procedure::GetHelper,
        Procedure::DeleteWithReturning,
        Procedure::UnlinkWithReturning,
        Procedure::SetNotArrayHelper,
        Procedure::SetKeysTtl,
        Procedure::DropKeysTtl,
        Procedure::AppendValueToArray,
        Procedure::MassRemoveWithReport,
        Procedure::ExistingKeys,
    ];

    /// Catalog name, also the file stem under `lua/`
    pub fn name(self) -> &'static str {
        match self {
            Procedure::RenameKey => "rename_key",
            Procedure::RemoveAllKeys => "remove_all_keys",
            Procedure::RpushHelper => "rpush_helper",
            Procedure::GetHelper => "get_helper",
            Procedure::DeleteWithReturning => "delete_with_returning",
            Procedure::UnlinkWithReturning => "unlink_with_returning",
            Procedure::SetNotArrayHelper => "set_not_array_helper",
            Procedure::SetKeysTtl => "set_keys_ttl",
            Procedure::DropKeysTtl => "drop_keys_ttl",
            Procedure::AppendValueToArray => "append_value_to_array",
            Procedure::MassRemoveWithReport => "mass_remove_with_report",
            Procedure::ExistingKeys => "existing_keys",
        }
    }

    /// Lua source text
    pub fn source(self) -> &'static str {
        match self {
            Procedure::RenameKey => include_str!("../../lua/rename_key.lua"),
            Procedure::RemoveAllKeys => include_str!("../../lua/remove_all_keys.lua"),
            Procedure::RpushHelper => include_str!("../../lua/rpush_helper.lua"),
            Procedure::GetHelper => include_str!("../../lua/get_helper.lua"),
            Procedure::DeleteWithReturning => include_str!("../../lua/delete_with_returning.lua"),
            Procedure::UnlinkWithReturning => include_str!("../../lua/unlink_with_returning.lua"),
            Procedure::SetNotArrayHelper => include_str!("../../lua/set_not_array_helper.lua"),
            Procedure::SetKeysTtl => include_str!("../../lua/set_keys_ttl.lua"),
            Procedure::DropKeysTtl => include_str!("../../lua/drop_keys_ttl.lua"),
            Procedure::AppendValueToArray => include_str!("../../lua/append_value_to_array.lua"),
            Procedure::MassRemoveWithReport => {
                include_str!("../../lua/mass_remove_with_report.lua")
            }
            Procedure::ExistingKeys => include_str!("../../lua/existing_keys.lua"),
        }
    }

    /// True when the procedure never writes, so resending it is harmless
    pub fn is_read_only(self) -> bool {
        matches!(self, Procedure::GetHelper | Procedure::ExistingKeys)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Find the procedure whose source is exactly `source`
    pub fn from_source(source: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.source() == source)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Procedure {
    type Err = LuaKvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| LuaKvError::UnknownProcedure(s.to_string()))
    }
}
