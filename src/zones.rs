//! EKS API server zone codes
//!
//! EKS shards API servers behind hostnames of the form
//! `https://<cluster_id>.<code>.<region>.eks.amazonaws.com`. The set of codes
//! is undocumented and cannot be derived, so it is kept here as a literal list.
//! The order is the probing order: codes seen more often come first.

use crate::extractor::ClusterLocation;

/// Known zone codes, in probing order
pub const ZONE_CODES: &[&str] = &[
    "gr5", "sk1", "uw2", "ue1", "ew1", "ap1", "se1", "ne1", //
    "sk2", "sk3", "sk4", "sk5", "sk6", "sk7", "sk8", "sk9", //
    "gr1", "gr2", "gr3", "gr4", "gr7", "gr6", "gr8", "gr9", //
    "ue2", "ue3", "ue4", "ue5", "ue6", "ue7", "ue8", "ue9", //
    "ew2", "ew3", "ew4", "ew5", "ew6", "ew7", "ew8", "ew9", //
    "ap2", "ap3", "ap4", "ap5", "ap6", "ap7", "ap8", "ap9", //
    "se2", "se3", "se4", "se5", "se6", "se7", "se8", "se9", //
    "ne2", "ne3", "ne4", "ne5", "ne6", "ne7", "ne8", "ne9", //
    "uw1", "uw3", "uw4", "uw5", "uw6", "uw7", "uw8", "uw9",
];

/// Build the API server URL for one zone code
pub fn candidate_url(location: &ClusterLocation, code: &str) -> String {
    format!(
        "https://{}.{}.{}.eks.amazonaws.com",
        location.cluster_id, code, location.region
    )
}

/// All candidate URLs for `location`, in the order of `codes`
pub fn candidate_urls<'a>(
    location: &'a ClusterLocation,
    codes: &'a [String],
) -> impl ExactSizeIterator<Item = String> + 'a {
    codes.iter().map(move |code| candidate_url(location, code))
}
