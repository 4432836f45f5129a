use shadow_rs::ShadowBuilder;

// Build metadata behind `messagehub --version` and the health endpoint.
fn main() {
    if let Err(e) = ShadowBuilder::builder().build() {
        panic!("failed to generate build metadata: {e}");
    }
}
