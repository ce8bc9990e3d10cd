use std::collections::BTreeMap;

pub const COMPONENT_NAME: &str = "meteringsvc";
pub const RELEASE_NAME: &str = "metering";
/// Selector label carrying the owning MeteringReceiver's name.
pub const RECEIVER_CR_LABEL: &str = "meteringreceiver_cr";

const PRODUCT_NAME: &str = "IBM Cloud Platform Common Services";
const PRODUCT_ID: &str = "068a62892a1e4db39641342e592daa25";
const PRODUCT_VERSION: &str = "3.4.0";
const DEPENDENCIES: &str = "ibm-common-services.auth-idp, mongodb, cert-manager";

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn metadata_labels(app: &str) -> BTreeMap<String, String> {
    map(&[
        ("app.kubernetes.io/name", app),
        ("app.kubernetes.io/component", COMPONENT_NAME),
        ("app.kubernetes.io/managed-by", "operator"),
        ("app.kubernetes.io/instance", RELEASE_NAME),
        ("release", RELEASE_NAME),
    ])
}

/// Labels selecting the pods that belong to one MeteringReceiver.
pub fn selector_labels(app: &str, cr_name: &str) -> BTreeMap<String, String> {
    map(&[
        ("app", app),
        ("component", COMPONENT_NAME),
        (RECEIVER_CR_LABEL, cr_name),
    ])
}

pub fn pod_labels(app: &str, cr_name: &str) -> BTreeMap<String, String> {
    let mut labels = metadata_labels(app);
    labels.extend(selector_labels(app, cr_name));
    labels
}

pub fn certificate_labels(app: &str, component: &str) -> BTreeMap<String, String> {
    map(&[
        ("app", app),
        ("component", component),
        ("release", RELEASE_NAME),
    ])
}

pub fn pod_annotations() -> BTreeMap<String, String> {
    map(&[
        ("productName", PRODUCT_NAME),
        ("productID", PRODUCT_ID),
        ("productVersion", PRODUCT_VERSION),
        ("productMetric", "FREE"),
        ("clusterhealth.ibm.com/dependencies", DEPENDENCIES),
    ])
}

/// Render labels as an equality-based label selector (`k=v,k2=v2`).
pub fn to_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
