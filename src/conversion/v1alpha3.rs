//! `v1alpha3 <-> v1`
//!
//! Identical specs. Only `v1` tracks `failureCount` and `observedGeneration`.

use crate::crd::{v1 as new, v1alpha3 as old};

pub fn upgrade(src: old::PassboltSecret) -> new::PassboltSecret {
    new::PassboltSecret {
        metadata: src.metadata,
        spec: new::PassboltSecretSpec {
            leave_on_delete: src.spec.leave_on_delete,
            secret_type: src.spec.secret_type,
            passbolt_secret_id: src.spec.passbolt_secret_id,
            passbolt_secrets: src
                .spec
                .passbolt_secrets
                .into_iter()
                .map(|(key, r)| {
                    let reference = new::PassboltSecretRef {
                        id: r.id,
                        field: r.field,
                        value: r.value,
                    };
                    (key, reference)
                })
                .collect(),
            plain_text_fields: src.spec.plain_text_fields,
        },
        status: src.status.map(|status| new::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| new::SyncError {
                    message: e.message,
                    passbolt_secret_id: e.passbolt_secret_id,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
            failure_count: 0,
            observed_generation: None,
            next_reconcile_time: None,
        }),
    }
}

pub fn downgrade(src: new::PassboltSecret) -> old::PassboltSecret {
    old::PassboltSecret {
        metadata: src.metadata,
        spec: old::PassboltSecretSpec {
            leave_on_delete: src.spec.leave_on_delete,
            secret_type: src.spec.secret_type,
            passbolt_secret_id: src.spec.passbolt_secret_id,
            passbolt_secrets: src
                .spec
                .passbolt_secrets
                .into_iter()
                .map(|(key, r)| {
                    let reference = old::PassboltSecretRef {
                        id: r.id,
                        field: r.field,
                        value: r.value,
                    };
                    (key, reference)
                })
                .collect(),
            plain_text_fields: src.spec.plain_text_fields,
        },
        status: src.status.map(|status| old::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| old::SyncError {
                    message: e.message,
                    passbolt_secret_id: e.passbolt_secret_id,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
        }),
    }
}
