//! Table retrieval by repeated GETBULK.

use std::collections::BTreeMap;

use super::Session;
use crate::error::Result;
use crate::oid::Oid;
use crate::transport::Transport;
use crate::value::Value;

impl<T: Transport> Session<T> {
    /// Retrieve every binding under `root`.
    ///
    /// Issues GETBULK requests of [`max_repetitions`](super::SessionConfig::max_repetitions)
    /// starting at `root`, each continuing from the last OID of the previous
    /// reply. Bindings outside `root` are dropped. The walk ends when the
    /// cursor leaves `root`, or when a reply is empty or does not move the
    /// cursor; agents that loop are cut off by the latter.
    ///
    /// Requires SNMPv2c or SNMPv3. An exception in a reply (for example
    /// endOfMibView at the end of the agent's MIB) aborts the walk with
    /// [`Error::Exception`](crate::Error::Exception).
    pub async fn get_table(&mut self, root: &Oid) -> Result<BTreeMap<Oid, Value>> {
        let mut table = BTreeMap::new();
        let mut cursor = root.clone();
        let max_repetitions = self.config.max_repetitions;

        loop {
            let varbinds = self.get_bulk_varbinds(&cursor, max_repetitions).await?;
            let Some(last) = varbinds.last().map(|vb| vb.oid.clone()) else {
                tracing::debug!(target: "snmp_session::session", { snmp.oid = %cursor }, "empty reply ends table walk");
                break;
            };

            for vb in varbinds {
                if vb.oid.within(root) {
                    table.insert(vb.oid, vb.value);
                }
            }

            if last == cursor {
                tracing::debug!(target: "snmp_session::session", { snmp.oid = %cursor }, "no progress, ending table walk");
                break;
            }
            cursor = last;
            if !cursor.within(root) {
                break;
            }
        }

        tracing::debug!(
            target: "snmp_session::session",
            { snmp.root = %root, snmp.rows = table.len() },
            "table walk complete"
        );
        Ok(table)
    }
}
