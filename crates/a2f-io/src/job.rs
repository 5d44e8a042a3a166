//! Job descriptor (`hecmw_ctrl.dat`) and partition descriptor
//! (`hecmw_part_ctrl.dat`).

use crate::deck::Deck;
use crate::options::Distributed;

pub const JOB_FILE: &str = "hecmw_ctrl.dat";
pub const PARTITION_FILE: &str = "hecmw_part_ctrl.dat";

pub fn write_job(job_name: &str, distributed: &Distributed) -> String {
    let mesh = format!("{job_name}.msh");
    let mut deck = Deck::new();
    if distributed.enabled {
        let parts = format!("{job_name}_p");
        deck.line("!MESH, NAME=part_in,TYPE=HECMW-ENTIRE");
        deck.line(&mesh);
        deck.line("!MESH, NAME=part_out,TYPE=HECMW-DIST");
        deck.line(&parts);
        deck.line("!MESH, NAME=fstrMSH,TYPE=HECMW-DIST");
        deck.line(&parts);
    } else {
        deck.line("!MESH, NAME=fstrMSH,TYPE=HECMW-ENTIRE");
        deck.line(&mesh);
    }
    deck.line("!MESH, NAME=mesh,TYPE=HECMW-ENTIRE");
    deck.line(&mesh);
    deck.line("!CONTROL,NAME=fstrCNT");
    deck.line(format!("{job_name}.cnt"));
    deck.line("!RESTART,NAME=restart_out,IO=OUT");
    deck.line(format!("{job_name}.restart"));
    deck.line("!RESULT,NAME=fstrRES,IO=OUT");
    deck.line(format!("{job_name}.res"));
    deck.line("!RESULT,NAME=result,IO=IN");
    deck.line(format!("{job_name}.res"));
    deck.line("!RESULT,NAME=vis_out,IO=OUT");
    deck.line(format!("{job_name}.vis"));
    deck.into_string()
}

/// Partition descriptor, present only for distributed runs.
pub fn write_partition(distributed: &Distributed) -> Option<String> {
    distributed.enabled.then(|| {
        format!(
            "!PARTITION,TYPE=NODE-BASED,METHOD=PMETIS,DOMAIN={}\n",
            distributed.domains
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_domain_job() {
        let text = write_job("beam", &Distributed::default());
        assert!(text.starts_with("!MESH, NAME=fstrMSH,TYPE=HECMW-ENTIRE\nbeam.msh\n"));
        assert!(text.contains("!CONTROL,NAME=fstrCNT\nbeam.cnt\n"));
        assert!(text.ends_with("!RESULT,NAME=vis_out,IO=OUT\nbeam.vis\n"));
        assert!(!text.contains("HECMW-DIST"));
        assert_eq!(write_partition(&Distributed::default()), None);
    }

    #[test]
    fn distributed_job_reads_partitioned_mesh() {
        let distributed = Distributed {
            enabled: true,
            domains: 8,
        };
        let text = write_job("beam", &distributed);
        assert!(text.starts_with("!MESH, NAME=part_in,TYPE=HECMW-ENTIRE\nbeam.msh\n"));
        assert!(text.contains("!MESH, NAME=fstrMSH,TYPE=HECMW-DIST\nbeam_p\n"));
        assert_eq!(
            write_partition(&distributed).as_deref(),
            Some("!PARTITION,TYPE=NODE-BASED,METHOD=PMETIS,DOMAIN=8\n")
        );
    }
}
