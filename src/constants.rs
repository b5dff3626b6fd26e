// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager used for server-side apply
pub const FIELD_MANAGER: &str = "nmstate-revert";

/// nmstate API coordinates
pub mod nmstate {
    pub const GROUP: &str = "nmstate.io";
    pub const POLICY_VERSION: &str = "v1";
    pub const POLICY_KIND: &str = "NodeNetworkConfigurationPolicy";
    pub const ENACTMENT_VERSION: &str = "v1beta1";
    pub const ENACTMENT_KIND: &str = "NodeNetworkConfigurationEnactment";
    pub const ENACTMENT_PLURAL: &str = "nodenetworkconfigurationenactments";
}

/// Labels the operator puts on enactments
pub mod labels {
    /// Name of the policy an enactment belongs to
    pub const ENACTMENT_POLICY: &str = "nmstate.io/policy";
    /// Name of the node an enactment reports on
    pub const ENACTMENT_NODE: &str = "nmstate.io/node";
}

/// Enactment condition types, in the order they decide the phase
pub mod conditions {
    pub const FAILING: &str = "Failing";
    pub const ABORTED: &str = "Aborted";
    pub const AVAILABLE: &str = "Available";
    pub const PROGRESSING: &str = "Progressing";
    pub const PENDING: &str = "Pending";
}

/// OLM API coordinates used by the operator teardown
pub mod olm {
    pub const GROUP: &str = "operators.coreos.com";
    pub const VERSION: &str = "v1alpha1";
    pub const SUBSCRIPTION_KIND: &str = "Subscription";
    pub const SUBSCRIPTION_PLURAL: &str = "subscriptions";
    pub const CSV_KIND: &str = "ClusterServiceVersion";
    pub const CSV_PLURAL: &str = "clusterserviceversions";
}

/// Defaults for values read from the environment
pub mod defaults {
    pub const NAMESPACE: &str = "openshift-nmstate";
    pub const CLEANUP_POLICY_NAME: &str = "dns-revert";
    pub const TIMEOUT_SECS: u64 = 300;
    pub const POLL_INTERVAL_SECS: u64 = 10;
    pub const OPERATOR_SUBSCRIPTION: &str = "kubernetes-nmstate-operator";
    pub const OPERATOR_CRDS: &[&str] = &[
        "nmstates.nmstate.io",
        "nodenetworkconfigurationenactments.nmstate.io",
        "nodenetworkconfigurationpolicies.nmstate.io",
        "nodenetworkstates.nmstate.io",
    ];
}

/// Retry configuration for transient control-plane failures
pub mod retry {
    /// Total attempts per call, including the first one
    pub const MAX_ATTEMPTS: u32 = 5;
    /// Initial backoff in milliseconds
    pub const INITIAL_BACKOFF_MS: u64 = 1_000;
    /// Maximum backoff in milliseconds (exponential backoff cap)
    pub const MAX_BACKOFF_MS: u64 = 30_000;
    /// Delete-and-check rounds before giving up on verifying deletion
    pub const DELETE_VERIFY_ATTEMPTS: u32 = 3;
}

/// Process exit codes
pub mod exit_codes {
    pub const SUCCEEDED: u8 = 0;
    pub const FAILED: u8 = 1;
    pub const TIMED_OUT: u8 = 2;
}
