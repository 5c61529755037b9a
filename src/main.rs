use turntable::SceneConfig;

fn main() -> anyhow::Result<()> {
    turntable::run(SceneConfig::default().with_env_overrides())
}
