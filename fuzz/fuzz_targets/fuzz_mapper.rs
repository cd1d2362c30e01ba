#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Map against the bundled dataset: must never panic, only return text.
    let _ = simdmap::map_instruction(data);

    // Diagnostics walk every candidate, including malformed ones.
    let mapper = simdmap::Mapper::new(simdmap::Registry::builtin());
    for line in data.lines() {
        let _ = mapper.explain(line);
    }

    // Arbitrary text as a dataset.
    if let Ok(registry) = simdmap::Registry::from_toml_str(data) {
        let _ = registry.validate();
        let _ = simdmap::map_with_registry("VPADDD X1, X9, X2", &registry);
    }
});
