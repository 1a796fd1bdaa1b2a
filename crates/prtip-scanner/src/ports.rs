//! Port Sort Table (SPEC §4.B): order a port list by real-world popularity so the scan surfaces
//! results for commonly-open services first.

use prtip_core::popularity_rank;

/// Stable sort of `ports` by ascending popularity rank; unranked ports sort after all ranked ones,
/// ordered numerically among themselves.
pub fn sorted_port_list(ports: &[u16]) -> Vec<u16> {
    let mut sorted = ports.to_vec();
    sorted.sort_by_key(|&port| (popularity_rank(port).unwrap_or(usize::MAX), port));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_ports_sort_before_obscure_ones() {
        let sorted = sorted_port_list(&[54321, 80, 22, 443]);
        assert_eq!(sorted[3], 54321, "unranked port sorts last");
        assert!(sorted[..3].contains(&80));
        assert!(sorted[..3].contains(&22));
        assert!(sorted[..3].contains(&443));
    }

    #[test]
    fn unranked_ports_keep_numeric_order() {
        let sorted = sorted_port_list(&[60000, 50000, 55000]);
        assert_eq!(sorted, vec![50000, 55000, 60000]);
    }

    #[test]
    fn sort_is_stable_and_preserves_input_length() {
        let input = vec![443, 80, 443, 22];
        let sorted = sorted_port_list(&input);
        assert_eq!(sorted.len(), input.len());
    }
}
