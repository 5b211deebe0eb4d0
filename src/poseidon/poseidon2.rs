//! Poseidon2 over Goldilocks, width 12, x^7 S-box, RF=8, RP=22.
//!
//! Layer structure:
//! - external layer: circ(2,3,1,1) on each 4-lane chunk, then each lane adds the
//!   column sum over chunks
//! - internal layer: `s[i] = s[i]·d[i] + Σ s`
//!
//! Round constants are the published width-12 Goldilocks set used by Poseidon2 plonky2
//! provers; `d` is the Goldilocks width-12 internal diagonal.

use super::{GlArith, GlPermutation, SPONGE_WIDTH};
use crate::goldilocks::native::{self, P};
use crate::goldilocks::GlVar;
use ark_relations::r1cs::SynthesisError;
use once_cell::sync::Lazy;

const WIDTH: usize = SPONGE_WIDTH;
const HALF_RF: usize = 4;
const RP: usize = 22;

const M4: [[u64; 4]; 4] = [[2, 3, 1, 1], [1, 2, 3, 1], [1, 1, 2, 3], [3, 1, 1, 2]];

pub const EXTERNAL_INITIAL_CONSTANTS: [[u64; WIDTH]; HALF_RF] = [
    [
        16014189612424237997, 3234130550329388769, 12770310677236056740, 2522059831407870648,
        16516262146806714622, 14346955448063414307, 18098338222873569217, 16506915715127403909,
        1740142456686137078, 12590467223883536996, 6078974114340264836, 394831167838043051,
    ],
    [
        14292589812259157005, 8460209114181982917, 15011214242444884325, 13462791225860855588,
        10627487433335459888, 1624755420897328351, 2063209653571085939, 18067308934647734526,
        6538629857251435881, 3217577208297444599, 15338949981999486846, 12864825732577819657,
    ],
    [
        7706595502408214652, 16738738787192632900, 10982098878410176042, 14268282552721501435,
        11454941221469237933, 14617692430364504137, 13916571882331192922, 6814962505004916576,
        14028125575994250062, 13225657213032524375, 4626384406055707720, 14990940063728124690,
    ],
    [
        1911457633639084210, 7163368907680515062, 8413980300210324228, 1675047486134189732,
        16041698939438607870, 11228094700653369233, 6501995543359590331, 9685480985245200466,
        12679244446883551807, 8464058752967496937, 7741578890911679009, 3283703336442212930,
    ],
];

pub const EXTERNAL_TERMINAL_CONSTANTS: [[u64; WIDTH]; HALF_RF] = [
    [
        17351355999406684364, 16137439874414729127, 12055514998018621195, 594679093829729354,
        16737512074876758192, 2737574840832795298, 3465446135797481753, 4292409154763056687,
        11224437497275816114, 4023045499853201921, 10779624707907978147, 14278665975259142116,
    ],
    [
        11903321889543839706, 5408672356853253133, 11722650664643554577, 15832064295836011218,
        12196513835950390987, 4557876614450441262, 4514423607167246200, 13179281050059116604,
        13816175314507993453, 16904171011585020664, 9501194326912928839, 16115508209786346411,
    ],
    [
        14980304976005993651, 13949798916377127336, 8391339834223394752, 2486734703723642889,
        16495720201386686142, 17027676271156490018, 9836722774726345255, 1598759041324173985,
        9904883565707568937, 7841704489011952451, 588114624806878733, 673913537142101185,
    ],
    [
        4599835491909300182, 12688992728618520237, 14877058244946658134, 10918174468110998885,
        10255536904610753386, 2590325024884566512, 13607037626913552939, 9862747855710264415,
        376886820764458257, 9236712289059050564, 7363125273922585709, 6340039608049649771,
    ],
];

pub const INTERNAL_CONSTANTS: [u64; RP] = [
    3164763325237167292, 4510474569205763846, 10020902063516359798, 8069563132531746417,
    3254592259677490479, 11985549796265474924, 10987927494624206223, 12015039453665918149,
    4575586241449602538, 10824249772622471957, 9852067153475416880, 18282006677946798315,
    17127667785536367426, 9262743637454041195, 7842676173661650237, 6586650076667080425,
    3357942524992632948, 13653200854074857022, 5944505826517591163, 1374723928025097978,
    360175609930259452, 18390393266911553461,
];

pub const INTERNAL_DIAG: [u64; WIDTH] = [
    0xc3b6c08e23ba9300, 0xd84b5de94a324fb6, 0x0d0c371c5b35b84f, 0x7964f570e7188037,
    0x5daf18bbd996604b, 0x6743bc47b9595257, 0x5528b9362c59bb70, 0xac45e25b7127b68b,
    0xa2077d7dfbb606b5, 0xf3faac6faee378ae, 0x0c6388b51545e883, 0xd27dbb6944917b60,
];

pub struct Poseidon2Params {
    /// Initial rounds followed by terminal rounds.
    pub external_constants: Vec<[u64; WIDTH]>,
    pub internal_constants: Vec<u64>,
    /// `1 + d[i]` on the diagonal, all-ones elsewhere.
    pub internal_matrix: [[u64; WIDTH]; WIDTH],
    pub external_matrix: [[u64; WIDTH]; WIDTH],
}

fn external_matrix() -> [[u64; WIDTH]; WIDTH] {
    let mut m = [[0u64; WIDTH]; WIDTH];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            let same_chunk = i / 4 == j / 4;
            *entry = M4[i % 4][j % 4] * if same_chunk { 2 } else { 1 };
        }
    }
    m
}

fn internal_matrix(diag: &[u64]) -> [[u64; WIDTH]; WIDTH] {
    let mut m = [[1u64; WIDTH]; WIDTH];
    for i in 0..WIDTH {
        m[i][i] = native::add(diag[i], 1);
    }
    m
}

pub fn poseidon2_gl_t12() -> Poseidon2Params {
    Poseidon2Params {
        external_constants: EXTERNAL_INITIAL_CONSTANTS
            .iter()
            .chain(EXTERNAL_TERMINAL_CONSTANTS.iter())
            .copied()
            .collect(),
        internal_constants: INTERNAL_CONSTANTS.to_vec(),
        internal_matrix: internal_matrix(&INTERNAL_DIAG),
        external_matrix: external_matrix(),
    }
}

pub static POSEIDON2_GL_PARAMS_T12: Lazy<Poseidon2Params> = Lazy::new(poseidon2_gl_t12);

fn apply_matrix<T: GlArith>(m: &[[u64; WIDTH]; WIDTH], state: &[T]) -> Result<Vec<T>, SynthesisError> {
    m.iter()
        .map(|row| {
            let terms: Vec<(&T, u64)> = state.iter().zip(row.iter().copied()).collect();
            T::linear_combination(&terms)
        })
        .collect()
}

fn external_round<T: GlArith>(
    params: &Poseidon2Params,
    state: &mut Vec<T>,
    round: usize,
) -> Result<(), SynthesisError> {
    for (s, &c) in state.iter_mut().zip(params.external_constants[round].iter()) {
        *s = s.add_const(c)?.sbox7()?;
    }
    *state = apply_matrix(&params.external_matrix, state)?;
    Ok(())
}

pub fn poseidon2_permute<T: GlArith>(input: &[T]) -> Result<Vec<T>, SynthesisError> {
    assert_eq!(input.len(), WIDTH, "Poseidon2 state must have width 12");
    let params = &*POSEIDON2_GL_PARAMS_T12;
    let mut state = apply_matrix(&params.external_matrix, input)?;
    for r in 0..HALF_RF {
        external_round(params, &mut state, r)?;
    }
    for &c in &params.internal_constants {
        state[0] = state[0].add_const(c)?.sbox7()?;
        state = apply_matrix(&params.internal_matrix, &state)?;
    }
    for r in HALF_RF..2 * HALF_RF {
        external_round(params, &mut state, r)?;
    }
    Ok(state)
}

fn apply_matrix_native(m: &[[u64; WIDTH]; WIDTH], state: &[u64; WIDTH]) -> [u64; WIDTH] {
    core::array::from_fn(|i| {
        m[i].iter()
            .zip(state.iter())
            .fold(0u64, |acc, (&c, &s)| native::add(acc, native::mul(c, s)))
    })
}

fn sbox7_native(x: u64) -> u64 {
    native::exp(x, 7)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Poseidon2Goldilocks;

impl GlPermutation for Poseidon2Goldilocks {
    fn permute(&self, state: &[GlVar]) -> Result<Vec<GlVar>, SynthesisError> {
        poseidon2_permute(state)
    }

    fn permute_native(&self, state: [u64; SPONGE_WIDTH]) -> [u64; SPONGE_WIDTH] {
        let params = &*POSEIDON2_GL_PARAMS_T12;
        let mut s = apply_matrix_native(&params.external_matrix, &state.map(|x| x % P));
        let external = |s: &mut [u64; WIDTH], r: usize| {
            for (x, &c) in s.iter_mut().zip(params.external_constants[r].iter()) {
                *x = sbox7_native(native::add(*x, c));
            }
            *s = apply_matrix_native(&params.external_matrix, s);
        };
        for r in 0..HALF_RF {
            external(&mut s, r);
        }
        for &c in &params.internal_constants {
            s[0] = sbox7_native(native::add(s[0], c));
            s = apply_matrix_native(&params.internal_matrix, &s);
        }
        for r in HALF_RF..2 * HALF_RF {
            external(&mut s, r);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fr;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;
    use p3_field::integers::QuotientMap;
    use p3_field::PrimeField64;
    use p3_goldilocks::{Goldilocks, Poseidon2Goldilocks as P3Poseidon2};
    use p3_poseidon2::ExternalLayerConstants;
    use p3_symmetric::Permutation;

    /// First four output words for the all-zero state.
    const ALL_ZERO_DIGEST: [u64; 4] =
        [0x96c96d7c6fc74071, 0x17a7339e2d98ad31, 0x75c5898ef7c24cdf, 0x907d7ffb30e5af4f];

    fn reference_permute(input: [u64; WIDTH]) -> [u64; WIDTH] {
        let gl = |rows: &[[u64; WIDTH]; HALF_RF]| -> Vec<[Goldilocks; WIDTH]> {
            rows.iter().map(|r| r.map(<Goldilocks as QuotientMap<u64>>::from_int)).collect()
        };
        let perm = P3Poseidon2::<WIDTH>::new(
            ExternalLayerConstants::new(
                gl(&EXTERNAL_INITIAL_CONSTANTS),
                gl(&EXTERNAL_TERMINAL_CONSTANTS),
            ),
            INTERNAL_CONSTANTS.iter().map(|&c| <Goldilocks as QuotientMap<u64>>::from_int(c)).collect(),
        );
        perm.permute(input.map(<Goldilocks as QuotientMap<u64>>::from_int)).map(|x| x.as_canonical_u64())
    }

    #[test]
    fn test_params_shape() {
        let p = poseidon2_gl_t12();
        assert_eq!(p.external_constants.len(), 2 * HALF_RF);
        assert_eq!(p.external_constants[HALF_RF], EXTERNAL_TERMINAL_CONSTANTS[0]);
        assert_eq!(p.internal_constants.len(), RP);
        assert!(p.external_constants.iter().flatten().all(|&c| c < P));
        assert_eq!(p.internal_matrix[3][3], native::add(INTERNAL_DIAG[3], 1));
        assert_eq!(p.internal_matrix[3][4], 1);
    }

    #[test]
    fn test_external_matrix_shape() {
        let m = external_matrix();
        assert_eq!(m[0][0], 4);
        assert_eq!(m[0][4], 2);
        assert_eq!(m[5][9], 2);
        assert_eq!(m[11][3], 2);
    }

    #[test]
    fn test_native_matches_reference_permutation() {
        let inputs: [[u64; WIDTH]; 3] = [
            [0; WIDTH],
            core::array::from_fn(|i| i as u64),
            core::array::from_fn(|i| P - 1 - i as u64 * 0x1_0000_0001),
        ];
        for input in inputs {
            assert_eq!(Poseidon2Goldilocks.permute_native(input), reference_permute(input));
        }
    }

    #[test]
    fn test_all_zero_known_answer() {
        let out = Poseidon2Goldilocks.permute_native([0; WIDTH]);
        assert_eq!(out[..4], ALL_ZERO_DIGEST);
    }

    #[test]
    fn test_gadget_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let input: [u64; WIDTH] = core::array::from_fn(|i| P - 1 - i as u64 * 77);
        let vars: Vec<GlVar> = input
            .iter()
            .map(|&v| GlVar::new_witness(cs.clone(), || Ok(v)).unwrap())
            .collect();
        let out = Poseidon2Goldilocks.permute(&vars).unwrap();
        let expected = Poseidon2Goldilocks.permute_native(input);
        for (o, e) in out.iter().zip(expected.iter()) {
            assert_eq!(o.value().unwrap(), *e);
        }
        assert!(cs.is_satisfied().unwrap());
        eprintln!("poseidon2 permutation constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_permutation_differs_from_poseidon() {
        let a = Poseidon2Goldilocks.permute_native([0; WIDTH]);
        let b = super::super::PoseidonGoldilocks.permute_native([0; WIDTH]);
        assert_ne!(a, b);
    }
}
