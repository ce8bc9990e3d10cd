use kube::core::CustomResourceExt;
use metering_receiver_operator::crd::MeteringReceiver;

fn main() {
    let crd = MeteringReceiver::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
    println!("{}", yaml);
}
