//! Neighborhood moves over per-vehicle node sequences.

/// One step in the local search neighborhood.
///
/// Routes are node index sequences with the depot implicit at both ends;
/// positions are indices into those sequences.
///
/// # Examples
///
/// ```
/// use u_fleet::local_search::Move;
///
/// let mut routes = vec![vec![1, 2, 3, 4], vec![5]];
///
/// Move::TwoOpt { route: 0, i: 1, j: 3 }.apply(&mut routes);
/// assert_eq!(routes[0], vec![1, 4, 3, 2]);
///
/// Move::OrOpt { route: 0, from: 0, len: 2, to: 2 }.apply(&mut routes);
/// assert_eq!(routes[0], vec![3, 2, 1, 4]);
///
/// Move::Relocate { from_route: 0, from_pos: 3, to_route: 1, to_pos: 0 }.apply(&mut routes);
/// assert_eq!(routes, vec![vec![3, 2, 1], vec![4, 5]]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Reverse the segment `[i..=j]` of one route.
    TwoOpt { route: usize, i: usize, j: usize },
    /// Cut `len` consecutive stops starting at `from` and reinsert them at
    /// position `to` of the shortened route.
    OrOpt {
        route: usize,
        from: usize,
        len: usize,
        to: usize,
    },
    /// Move one stop to another vehicle's route.
    Relocate {
        from_route: usize,
        from_pos: usize,
        to_route: usize,
        to_pos: usize,
    },
}

impl Move {
    /// Applies the move in place.
    ///
    /// Positions must be valid for `routes`; moves produced by the search
    /// always are.
    pub fn apply(&self, routes: &mut [Vec<usize>]) {
        match *self {
            Move::TwoOpt { route, i, j } => routes[route][i..=j].reverse(),
            Move::OrOpt {
                route,
                from,
                len,
                to,
            } => {
                let r = &mut routes[route];
                let segment: Vec<usize> = r.drain(from..from + len).collect();
                r.splice(to..to, segment);
            }
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => {
                let node = routes[from_route].remove(from_pos);
                routes[to_route].insert(to_pos, node);
            }
        }
    }

    /// The routes this move changes.
    pub fn routes(&self) -> (usize, Option<usize>) {
        match *self {
            Move::TwoOpt { route, .. } | Move::OrOpt { route, .. } => (route, None),
            Move::Relocate {
                from_route,
                to_route,
                ..
            } => (from_route, Some(to_route)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_opt_forward_and_back() {
        let mut routes = vec![vec![1, 2, 3, 4, 5]];
        Move::OrOpt {
            route: 0,
            from: 3,
            len: 1,
            to: 0,
        }
        .apply(&mut routes);
        assert_eq!(routes[0], vec![4, 1, 2, 3, 5]);

        Move::OrOpt {
            route: 0,
            from: 0,
            len: 3,
            to: 2,
        }
        .apply(&mut routes);
        assert_eq!(routes[0], vec![3, 5, 4, 1, 2]);
    }

    #[test]
    fn test_relocate_into_empty_route() {
        let mut routes = vec![vec![1, 2], vec![]];
        Move::Relocate {
            from_route: 0,
            from_pos: 0,
            to_route: 1,
            to_pos: 0,
        }
        .apply(&mut routes);
        assert_eq!(routes, vec![vec![2], vec![1]]);
    }

    #[test]
    fn test_touched_routes() {
        assert_eq!(Move::TwoOpt { route: 2, i: 0, j: 1 }.routes(), (2, None));
        let mv = Move::Relocate {
            from_route: 0,
            from_pos: 0,
            to_route: 3,
            to_pos: 0,
        };
        assert_eq!(mv.routes(), (0, Some(3)));
    }
}
