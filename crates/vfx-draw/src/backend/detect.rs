//! Backend detection and auto-selection.

use super::Backend;

/// Information about a compute backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Backend type.
    pub backend: Backend,
    /// Human-readable name.
    pub name: &'static str,
    /// Whether backend is available.
    pub available: bool,
    /// Priority for auto-selection (higher = preferred).
    pub priority: u32,
    /// Description.
    pub description: &'static str,
}

impl BackendInfo {
    /// Availability and rank of one concrete backend.
    pub fn probe(backend: Backend) -> Self {
        let available = backend.is_available();
        let (name, priority, description) = match backend {
            Backend::Wgpu if !cfg!(feature = "wgpu") => ("wgpu", 0, "not compiled in (enable the `wgpu` feature)"),
            Backend::Wgpu => ("wgpu", 100, "WGSL compute shaders on Vulkan, Metal or DX12"),
            _ => ("CPU", 10, "host kernels split across rayon threads"),
        };
        Self {
            backend,
            name,
            available,
            priority: if available { priority } else { 0 },
            description,
        }
    }
}

/// Detect all backends, best first.
pub fn detect_backends() -> Vec<BackendInfo> {
    let mut backends: Vec<BackendInfo> = [Backend::Cpu, Backend::Wgpu].into_iter().map(BackendInfo::probe).collect();
    backends.sort_by_key(|b| std::cmp::Reverse(b.priority));
    backends
}

/// Select the best available backend.
pub fn select_best_backend() -> Backend {
    detect_backends()
        .into_iter()
        .filter(|b| b.available)
        .max_by_key(|b| b.priority)
        .map(|b| b.backend)
        .unwrap_or(Backend::Cpu)
}

/// One line per backend: `[+] name: description` or `[-] ...`.
pub fn describe_backends() -> String {
    let mut desc = String::new();
    for info in detect_backends() {
        let status = if info.available { "+" } else { "-" };
        desc.push_str(&format!("[{}] {}: {}\n", status, info.name, info.description));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_listed_and_available() {
        let backends = detect_backends();
        let cpu = backends.iter().find(|b| b.backend == Backend::Cpu).unwrap();
        assert!(cpu.available);
        assert!(backends.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_best_is_available() {
        let best = select_best_backend();
        assert_ne!(best, Backend::Auto);
        assert!(best.is_available());
    }

    #[test]
    fn test_probe_matches_availability() {
        for backend in [Backend::Cpu, Backend::Wgpu] {
            let info = BackendInfo::probe(backend);
            assert_eq!(info.available, backend.is_available());
            if !info.available {
                assert_eq!(info.priority, 0);
            }
        }
        assert!(!cfg!(feature = "wgpu") || BackendInfo::probe(Backend::Wgpu).description.contains("WGSL"));
    }

    #[test]
    fn test_describe_lists_cpu() {
        assert!(describe_backends().contains("[+] CPU"));
    }
}
