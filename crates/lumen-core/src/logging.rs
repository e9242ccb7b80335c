pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("info,lumen_core=debug,lumen_render=debug")
        .init();
}
