#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use geo_types::{Coord, LineString};
    use rand::*;
    use rusty_match::*;
    use wkt::TryFromWkt;

    fn line(text: &str) -> LineString<f64> {
        LineString::try_from_wkt_str(text).unwrap()
    }

    fn random_coord(origin: Coord<f64>, step: f64) -> Coord<f64> {
        Coord {
            x: origin.x + random_range(-step..step),
            y: origin.y + random_range(-step..step),
        }
    }

    /// A wandering polyline starting near `origin`.
    fn random_line(origin: Coord<f64>, vertices: usize, step: f64) -> LineString<f64> {
        let mut coords = vec![origin];
        for _ in 1..vertices {
            let last = coords[coords.len() - 1];
            coords.push(random_coord(last, step));
        }
        LineString::new(coords)
    }

    fn random_segment() -> LineString<f64> {
        let start = random_coord(Coord { x: 0.0, y: 0.0 }, 100.0);
        LineString::new(vec![start, random_coord(start, 50.0)])
    }

    fn reversed(line: &LineString<f64>) -> LineString<f64> {
        LineString::new(line.0.iter().rev().copied().collect())
    }

    fn segments(lines: impl IntoIterator<Item = (Id, LineString<f64>)>) -> Segments {
        lines
            .into_iter()
            .map(|(id, geom)| Segment {
                id,
                parent_id: id,
                geom,
            })
            .collect()
    }

    /// References spread over a few square kilometres and targets digitised
    /// slightly off them, some split in two.
    fn random_networks(count: u64) -> (Segments, Segments) {
        let references: Vec<(Id, LineString<f64>)> = (0..count)
            .map(|id| {
                let origin = Coord {
                    x: random_range(0.0..2000.0),
                    y: random_range(0.0..2000.0),
                };
                (id, random_line(origin, random_range(2..5), 30.0))
            })
            .collect();

        let mut targets = Vec::new();
        for (id, reference) in &references {
            let shifted: LineString<f64> = reference
                .coords()
                .map(|c| random_coord(*c, 1.5))
                .collect();
            if random() && shifted.0.len() > 2 {
                let middle = shifted.0.len() / 2;
                targets.push((1000 + id, LineString::new(shifted.0[..=middle].to_vec())));
                targets.push((2000 + id, LineString::new(shifted.0[middle..].to_vec())));
            } else {
                targets.push((1000 + id, shifted));
            }
        }
        (segments(references), segments(targets))
    }

    #[test]
    fn angle_is_symmetric() {
        for _ in 0..1000 {
            let a = random_line(random_coord(Coord { x: 0.0, y: 0.0 }, 100.0), 4, 20.0);
            let b = random_line(random_coord(Coord { x: 0.0, y: 0.0 }, 100.0), 4, 20.0);
            let angle = angle_between(&a, &b);
            assert!((0.0..=90.0).contains(&angle), "angle = {angle}");
            assert!((angle - angle_between(&b, &a)).abs() < 1e-9);
        }
    }

    #[test]
    fn angle_ignores_direction() {
        for _ in 0..1000 {
            let a = random_segment();
            let b = random_segment();
            let angle = angle_between(&a, &b);
            assert!((angle - angle_between(&reversed(&a), &b)).abs() < 1e-9);
            assert!((angle - angle_between(&a, &reversed(&b))).abs() < 1e-9);
        }
    }

    #[test]
    fn hausdorff_is_symmetric() {
        for _ in 0..1000 {
            let a = random_line(random_coord(Coord { x: 0.0, y: 0.0 }, 100.0), 6, 20.0);
            let b = random_line(random_coord(Coord { x: 0.0, y: 0.0 }, 100.0), 3, 20.0);
            assert_eq!(hausdorff_distance(&a, &b), hausdorff_distance(&b, &a));
            assert_eq!(hausdorff_distance(&a, &a), 0.0);
        }
    }

    #[test]
    fn segments_stay_within_bounds() {
        for _ in 0..200 {
            let l = random_range(5.0..50.0);
            let line = random_line(Coord { x: 0.0, y: 0.0 }, random_range(2..20), 40.0);
            let total = length(&line);
            let pieces = Segmenter::new(l).cut(&line);

            if total < l {
                assert_eq!(pieces, vec![line]);
                continue;
            }
            for piece in &pieces {
                let piece_length = length(piece);
                assert!(
                    piece_length >= l / 3.0 - 1e-6 && piece_length <= l * 1.3 + 1e-6,
                    "piece of {piece_length} with L = {l}"
                );
            }
            let covered: f64 = pieces.iter().map(length).sum();
            assert!((covered - total).abs() < 1e-6);
        }
    }

    #[test]
    fn segment_ids_are_unique() {
        let mut network = Network::new(Source::Target, "EPSG:25832");
        for id in 0..100 {
            let line = random_line(Coord { x: 0.0, y: 0.0 }, random_range(2..10), 50.0);
            network
                .insert(Edge {
                    id,
                    geom: line,
                    attributes: Attributes::new(),
                })
                .unwrap();
        }

        let segments = Segmenter::new(10.0).segment_network(&network);
        let ids: HashSet<Id> = segments.id.iter().copied().collect();
        assert_eq!(ids.len(), segments.len());
        assert!(segments.parent_id.iter().all(|p| *p < 100));
    }

    #[test]
    fn rescoring_is_idempotent() {
        let conf = MatchConf::new(1);
        for _ in 0..200 {
            let reference = random_line(Coord { x: 0.0, y: 0.0 }, 4, 30.0);
            let targets: Vec<(Id, LineString<f64>)> = (0..5)
                .map(|id| (id, random_line(random_coord(Coord { x: 0.0, y: 0.0 }, 20.0), 3, 30.0)))
                .collect();
            let candidates = || targets.iter().map(|(id, line)| (*id, line));

            let first = score_candidates(1, &reference, candidates(), &conf);
            let second = score_candidates(1, &reference, candidates(), &conf);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn one_match_per_work_item() {
        let conf = MatchConf::new(3);
        let (references, targets) = random_networks(200);

        let engine = MatchEngine::new(&conf, &targets).unwrap();
        let outcome = engine.run(WorkItem::seeds(&references), &mut PartAllocator::default());

        let mut seen = HashSet::new();
        for m in &outcome.matches {
            assert!(seen.insert((m.reference_id, m.part)), "{m:?} matched twice");
            assert!(m.angle_degrees < conf.angular_threshold);
            assert!(m.hausdorff_distance < conf.hausdorff_threshold);
            assert!(m.pass <= conf.max_passes);
        }
        for u in &outcome.unmatched {
            assert!(!seen.contains(&(u.reference_id, u.part)));
        }
    }

    #[test]
    fn grid_agrees_with_unsplit_run() {
        let conf = MatchConf::new(3);
        let (references, targets) = random_networks(150);

        let pairs = |outcome: &MatchOutcome| {
            let mut pairs: Vec<(Id, Id, usize)> = outcome
                .matches
                .iter()
                .map(|m| (m.reference_id, m.target_id, m.pass))
                .collect();
            pairs.sort_unstable();
            pairs
        };

        let unsplit = MatchEngine::new(&conf, &targets)
            .unwrap()
            .run(WorkItem::seeds(&references), &mut PartAllocator::default());
        // cells larger than any reference line, overlap covering line and buffer
        let split = GridPartition::new(500.0, 200.0)
            .run(
                &conf,
                WorkItem::seeds(&references),
                &targets,
                &mut PartAllocator::default(),
            )
            .unwrap();

        assert_eq!(pairs(&unsplit), pairs(&split));
        assert_eq!(unsplit.unmatched.len(), split.unmatched.len());
    }

    #[test]
    fn identical_lines_match() {
        let conf = MatchConf::new(1);
        let geometry = line("LINESTRING(0 0, 10 0)");
        let scored = score_candidate(1, &geometry, 2, &geometry, &conf);
        let Scored::Kept(scored) = scored else {
            panic!("identical line discarded")
        };
        assert_eq!(scored.hausdorff_distance, 0.0);
        assert_eq!(scored.angle_degrees, 0.0);

        let candidates = [scored];
        let best = select_best(&candidates, &conf).unwrap();
        assert_eq!(best.percent_removed, 0.0);
        assert!(!is_partial(best, &conf));
    }

    #[test]
    fn short_target_leaves_remainder() {
        let mut reference = Network::new(Source::Reference, "EPSG:25832");
        reference
            .insert(Edge {
                id: 1,
                geom: line("LINESTRING(0 0, 100 0)"),
                attributes: Attributes::from([("vejklasse".to_owned(), "Cykelsti".into())]),
            })
            .unwrap();
        let mut target = Network::new(Source::Target, "EPSG:25832");
        target
            .insert(Edge {
                id: 5,
                geom: line("LINESTRING(0 0, 30 0)"),
                attributes: Attributes::new(),
            })
            .unwrap();

        let result = match_networks(&reference, &target, &MatchConf::new(2)).unwrap();
        let outcome = &result.outcome;

        assert_eq!(outcome.matches.len(), 1);
        assert!((outcome.matches[0].percent_removed - 70.0).abs() < 1e-9);
        assert!((length(&outcome.matches[0].clipped_geometry) - 30.0).abs() < 1e-9);

        let remainder = &outcome.partials[0].remainder_geometry.0[0];
        assert!((length(remainder) - 70.0).abs() < 1e-9);
        assert!((remainder.0[0].x - 30.0).abs() < 1e-9);
        assert_eq!(outcome.unmatched.len(), 1);

        let resolved = AttributeAggregator::new(&reference, &result, "vejklasse")
            .resolve(&outcome.matches);
        assert_eq!(resolved.get(&5), Some(&Value::from("Cykelsti")));
    }

    #[test]
    fn crossing_target_is_never_scored() {
        let conf = MatchConf::new(1);
        let reference = line("LINESTRING(0 0, 100 0)");
        let crossing = line("LINESTRING(50 -5, 50 5)");
        let (kept, warnings) = score_candidates(1, &reference, [(2, &crossing)], &conf);
        assert!(kept.is_empty());
        assert!(matches!(
            warnings[..],
            [MatchWarning::DegenerateClip { target_id: 2, .. }]
        ));
    }

    #[test]
    fn closer_of_two_candidates_wins() {
        let conf = MatchConf::new(1);
        let references = segments([(1, line("LINESTRING(0 0, 60 0)"))]);
        let targets = segments([
            (7, line("LINESTRING(0 3, 60 3)")),
            (8, line("LINESTRING(0 -2.5, 60 -2.5)")),
        ]);
        let outcome = MatchEngine::new(&conf, &targets)
            .unwrap()
            .run(WorkItem::seeds(&references), &mut PartAllocator::default());
        assert_eq!(outcome.matches[0].target_id, 8);
    }

    #[test]
    fn majority_by_length() {
        let resolved = resolve_majority([
            (Value::from("A"), 6.0),
            (Value::from("B"), 3.0),
            (Value::Null, 1.0),
        ]);
        assert_eq!(resolved, Some(Value::from("A")));
    }
}
