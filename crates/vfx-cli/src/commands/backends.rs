//! Backends command

use anyhow::Result;
use std::fmt::Write;
use tracing::trace;
use vfx_draw::{Backend, describe_backends};

pub fn run(verbose: u8) -> Result<()> {
    trace!("backends::run");
    print!("{}", report(verbose)?);
    Ok(())
}

fn report(verbose: u8) -> Result<String> {
    let mut out = describe_backends();
    let selected = Backend::Auto.resolve();
    writeln!(out, "auto: {selected}")?;
    if verbose > 0 {
        #[cfg(feature = "gpu")]
        {
            if selected == Backend::Wgpu {
                match vfx_draw::WgpuPrimitives::new() {
                    Ok(gpu) => writeln!(out, "adapter: {}", gpu.adapter_name())?,
                    Err(e) => writeln!(out, "adapter: unavailable ({e})")?,
                }
            }
        }
        writeln!(out, "Override with {}=cpu|wgpu|auto", vfx_draw::backend::BACKEND_ENV)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_cpu() {
        let text = report(0).unwrap();
        assert!(text.contains("[+] CPU"));
        assert!(text.contains("auto: "));
        assert!(!text.contains("Override"));
    }

    #[test]
    fn test_verbose_report_names_adapter() {
        let text = report(1).unwrap();
        assert!(text.contains(vfx_draw::backend::BACKEND_ENV));
        let gpu_selected = Backend::Auto.resolve() == Backend::Wgpu;
        assert_eq!(text.contains("adapter: "), cfg!(feature = "gpu") && gpu_selected);
    }
}
