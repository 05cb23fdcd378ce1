//! Multi-key operations
//!
//! Keys are deduplicated first. A reported removal runs as one procedure,
//! so the keys and values it reports are exactly the ones it removed.
//! Lists count as existing keys just like strings.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::procedure::Procedure;
use crate::protocol::Command;

use super::helpers::{flag, maybe_convert, parse_key_report, remove_duplicates};
use super::{Client, MassDeleteOptions, MassDeleteOutcome};

impl Client {
    /// Delete many keys, reporting what was there if asked
    pub fn mass_delete<I, K>(&self, keys: I, options: &MassDeleteOptions) -> Result<MassDeleteOutcome>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.mass_remove(false, keys, options)
    }

    /// Like `mass_delete`, with asynchronous reclamation on the store
    pub fn mass_unlink<I, K>(&self, keys: I, options: &MassDeleteOptions) -> Result<MassDeleteOutcome>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.mass_remove(true, keys, options)
    }

    /// The subset of `keys` holding a value, in input order
    pub fn mass_check_exists<I, K>(&self, keys: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = remove_duplicates(keys);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let no_args: [&str; 0] = [];
        let found = self.invoke(Procedure::ExistingKeys, &keys, &no_args)?;
        Ok(found.into_opt_string_array()?.into_iter().flatten().collect())
    }

    fn mass_remove<I, K>(
        &self,
        unlink: bool,
        keys: I,
        options: &MassDeleteOptions,
    ) -> Result<MassDeleteOutcome>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = remove_duplicates(keys);
        if keys.is_empty() {
            return Ok(MassDeleteOutcome::default());
        }

        let command = if unlink { "UNLINK" } else { "DEL" };
        if !options.wants_report() {
            tracing::debug!("{} {} keys", command, keys.len());
            self.pool.execute(&Command::new(command).args(&keys))?;
            return Ok(MassDeleteOutcome::default());
        }

        let args = [flag(unlink), flag(options.return_values)];
        let reply = self.invoke(Procedure::MassRemoveWithReport, &keys, &args)?;
        let report = parse_key_report(reply)?;
        tracing::debug!("{} {} of {} keys", command, report.len(), keys.len());

        let mut outcome = MassDeleteOutcome::default();
        if options.return_missing {
            let found: HashSet<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
            outcome.missing = keys
                .iter()
                .filter(|k| !found.contains(k.as_str()))
                .cloned()
                .collect();
        }
        if options.return_existing {
            outcome.existing = report.iter().map(|(k, _)| k.clone()).collect();
        }
        if options.return_values {
            let spec = options.convert_values_to.as_deref();
            outcome.values = report
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, maybe_convert(v, spec))))
                .collect::<HashMap<_, _>>();
        }
        Ok(outcome)
    }
}
