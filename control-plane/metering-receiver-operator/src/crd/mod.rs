pub mod certificate;
pub mod metering_receiver;

pub use certificate::{
    CERT_MANAGER_GROUP, CLUSTER_ISSUER_KIND, Certificate, CertificateSpec,
    IssuerRef,
};
pub use metering_receiver::{
    MeteringReceiver, MeteringReceiverSpec, MeteringReceiverStatus,
    MongoDbSpec, NO_PODS,
};
